//! Endpoint error taxonomy.
//!
//! A GET without a challenge code is not an error; it is answered with the
//! status payload instead.

use thiserror::Error;

use super::request::BodyRejection;
use super::response::{EndpointResponse, ErrorResponse, SUPPORTED_METHODS};

#[derive(Debug, Error)]
pub enum EndpointError {
    /// A verification token was supplied and does not match the configured one.
    #[error("invalid verification token")]
    TokenMismatch,

    /// The notification body is not valid JSON.
    #[error("invalid notification format: {0}")]
    MalformedNotification(#[from] serde_json::Error),

    /// The notification body could not be read as text.
    #[error("unreadable notification body: {0:?}")]
    UnreadableBody(BodyRejection),

    /// The request method is neither GET nor POST.
    #[error("method not allowed: {0}")]
    UnsupportedMethod(String),

    /// No host to build the challenge URL from.
    #[error("missing host header")]
    MissingHost,
}

impl EndpointError {
    pub fn status(&self) -> u16 {
        match self {
            EndpointError::TokenMismatch => 401,
            EndpointError::MalformedNotification(_) => 400,
            EndpointError::UnreadableBody(_) => 400,
            EndpointError::UnsupportedMethod(_) => 405,
            EndpointError::MissingHost => 400,
        }
    }

    /// Render the error as a JSON response. The expected token is never echoed.
    pub fn into_response(self) -> EndpointResponse {
        let body = match &self {
            EndpointError::TokenMismatch => ErrorResponse::new("Invalid verification token"),
            EndpointError::MalformedNotification(_) | EndpointError::UnreadableBody(_) => {
                ErrorResponse::new("Invalid notification format")
            }
            EndpointError::UnsupportedMethod(method) => ErrorResponse {
                error: "Method not allowed",
                method: Some(method.clone()),
                supported: Some(SUPPORTED_METHODS),
            },
            EndpointError::MissingHost => ErrorResponse::new("Missing host header"),
        };

        EndpointResponse::json(self.status(), &body)
    }
}
