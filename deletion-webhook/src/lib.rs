//! Marketplace account-deletion webhook.
//!
//! This library provides:
//! - `endpoint`: the endpoint logic (challenge verification, notification
//!   acknowledgment), independent of any HTTP framework
//! - `web`: the axum hosting layer
//! - `config`: environment configuration
//!
//! ## Architecture
//!
//! ```text
//! HTTP → web::account_deletion → InboundRequest → DeletionEndpoint → EndpointResponse → HTTP
//! ```

pub mod config;
pub mod endpoint;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use endpoint::{DeletionEndpoint, EndpointError, EndpointResponse, InboundRequest, RequestMethod};
pub use web::AppState;
