//! Web server module: the hosting layer for the deletion endpoint.
//!
//! This module provides a thin web server that:
//! - Serves the endpoint at the configured path for every method
//! - Serves a `/health` liveness check
//! - Hands each request to `DeletionEndpoint` and returns its response verbatim

pub mod handlers;

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    account_deletion, into_http_response, liveness, to_inbound_request, AppState,
    LivenessResponse, MAX_BODY_BYTES,
};

/// Build the router for the given state.
pub fn router(state: AppState) -> Router {
    let endpoint_path = state.endpoint_path().to_string();

    Router::new()
        .route("/health", get(liveness))
        .route(&endpoint_path, any(account_deletion))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
