//! Response bodies and the response object handed back to the hosting layer.

use serde::Serialize;
use tracing::error;

/// Methods the endpoint accepts, as advertised in 405 responses.
pub const SUPPORTED_METHODS: [&str; 2] = ["GET", "POST"];

/// Response returned to the hosting layer, which writes it out verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl EndpointResponse {
    /// Serialize `body` into a JSON response.
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self {
                status,
                headers: json_headers(),
                body,
            },
            Err(e) => {
                error!(error = %e, "response_serialize_failed");
                Self {
                    status: 500,
                    headers: json_headers(),
                    body: r#"{"error":"Internal server error"}"#.to_string(),
                }
            }
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("Content-Type".to_string(), "application/json".to_string())]
}

// =============================================================================
// Response Bodies
// =============================================================================

/// Answer to a verification challenge.
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    #[serde(rename = "challengeResponse")]
    pub challenge_response: String,
}

/// Acknowledgment of a deletion notification.
#[derive(Debug, Serialize)]
pub struct NotificationAck {
    pub status: &'static str,
    pub timestamp: String,
    #[serde(rename = "notificationId")]
    pub notification_id: String,
}

/// Status payload for GET requests without a challenge.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub verification_token: &'static str,
    pub endpoint_path: String,
    pub methods_supported: [&'static str; 2],
    pub expected_params: [&'static str; 2],
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported: Option<[&'static str; 2]>,
}

impl ErrorResponse {
    pub fn new(error: &'static str) -> Self {
        Self {
            error,
            method: None,
            supported: None,
        }
    }
}
