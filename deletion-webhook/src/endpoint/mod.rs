//! Marketplace account-deletion endpoint.
//!
//! One endpoint, three jobs:
//! - answer the endpoint-ownership challenge (GET with `challenge_code`)
//! - acknowledge account-deletion notifications (POST)
//! - describe itself on a plain GET
//!
//! ## Request Flow
//!
//! ```text
//! InboundRequest → classify() → Route → handler → EndpointResponse
//! ```
//!
//! [`DeletionEndpoint::handle`] is a pure function of the request, the
//! configured token and path, and the receive timestamp passed in.

pub mod challenge;
pub mod error;
pub mod notification;
pub mod request;
pub mod response;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

pub use challenge::{challenge_response, endpoint_url, respond_to_challenge, VerificationChallenge};
pub use error::EndpointError;
pub use notification::{parse_notification, NotificationSummary, UNKNOWN_NOTIFICATION_ID};
pub use request::{
    BodyRejection, Headers, InboundRequest, RequestMethod, CHALLENGE_CODE_PARAM,
    VERIFICATION_TOKEN_PARAM,
};
pub use response::{
    ChallengeResponse, EndpointResponse, ErrorResponse, NotificationAck, StatusResponse,
    SUPPORTED_METHODS,
};

/// Which handler a request goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Verification(VerificationChallenge),
    Health,
    Notification,
    Unsupported(String),
}

/// Classify a request.
///
/// A GET with an empty `challenge_code` is treated like one without it. An
/// empty `verification_token` is treated as absent.
pub fn classify(request: &InboundRequest) -> Route {
    match &request.method {
        RequestMethod::Read => {
            let code = request
                .query_param(CHALLENGE_CODE_PARAM)
                .filter(|code| !code.is_empty());

            match code {
                Some(code) => Route::Verification(VerificationChallenge {
                    challenge_code: code.to_string(),
                    supplied_token: request
                        .query_param(VERIFICATION_TOKEN_PARAM)
                        .filter(|token| !token.is_empty())
                        .map(str::to_string),
                }),
                None => Route::Health,
            }
        }
        RequestMethod::Write => Route::Notification,
        RequestMethod::Other(method) => Route::Unsupported(method.clone()),
    }
}

/// The endpoint, holding the configuration it was built with.
#[derive(Clone)]
pub struct DeletionEndpoint {
    verification_token: String,
    endpoint_path: String,
}

impl DeletionEndpoint {
    pub fn new(verification_token: impl Into<String>, endpoint_path: impl Into<String>) -> Self {
        Self {
            verification_token: verification_token.into(),
            endpoint_path: endpoint_path.into(),
        }
    }

    pub fn endpoint_path(&self) -> &str {
        &self.endpoint_path
    }

    /// Handle a request received now.
    pub fn handle_now(&self, request: &InboundRequest) -> EndpointResponse {
        self.handle(request, Utc::now())
    }

    /// Handle a request received at `received_at`.
    pub fn handle(&self, request: &InboundRequest, received_at: DateTime<Utc>) -> EndpointResponse {
        let result = match classify(request) {
            Route::Verification(challenge) => self.verify(request, &challenge),
            Route::Health => Ok(self.status()),
            Route::Notification => acknowledge(request, received_at),
            Route::Unsupported(method) => {
                warn!(method = %method, "method_not_allowed");
                Err(EndpointError::UnsupportedMethod(method))
            }
        };

        result.unwrap_or_else(EndpointError::into_response)
    }

    fn verify(
        &self,
        request: &InboundRequest,
        challenge: &VerificationChallenge,
    ) -> Result<EndpointResponse, EndpointError> {
        info!(
            challenge_code_length = challenge.challenge_code.len(),
            token_supplied = challenge.supplied_token.is_some(),
            "verification_challenge_received"
        );

        let host = request.host().filter(|h| !h.is_empty()).ok_or_else(|| {
            warn!("verification_missing_host");
            EndpointError::MissingHost
        })?;

        let digest = respond_to_challenge(
            challenge,
            &self.verification_token,
            host,
            &self.endpoint_path,
        )?;

        info!(
            endpoint_url = %endpoint_url(host, &self.endpoint_path),
            "verification_challenge_answered"
        );

        Ok(EndpointResponse::json(
            200,
            &ChallengeResponse {
                challenge_response: digest,
            },
        ))
    }

    fn status(&self) -> EndpointResponse {
        info!("status_requested");

        EndpointResponse::json(
            200,
            &StatusResponse {
                status: "Marketplace Account Deletion Notification Endpoint",
                verification_token: "configured",
                endpoint_path: self.endpoint_path.clone(),
                methods_supported: ["GET (verification)", "POST (notifications)"],
                expected_params: [CHALLENGE_CODE_PARAM, VERIFICATION_TOKEN_PARAM],
            },
        )
    }
}

fn acknowledge(
    request: &InboundRequest,
    received_at: DateTime<Utc>,
) -> Result<EndpointResponse, EndpointError> {
    if let Some(rejection) = request.body_rejection {
        warn!(rejection = ?rejection, "notification_body_unreadable");
        return Err(EndpointError::UnreadableBody(rejection));
    }

    let summary = parse_notification(request.body.as_deref()).map_err(|e| {
        warn!(
            error = %e,
            body_length = request.body.as_ref().map(|b| b.len()).unwrap_or(0),
            "notification_parse_failed"
        );
        e
    })?;

    info!(
        notification_id = %summary.notification_id_or_unknown(),
        topic = ?summary.topic,
        publish_attempt_count = ?summary.publish_attempt_count,
        "notification_received"
    );

    Ok(EndpointResponse::json(
        200,
        &NotificationAck {
            status: "received",
            timestamp: received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            notification_id: summary.notification_id_or_unknown().to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;
    use sha2::{Digest, Sha256};

    const TOKEN: &str = "test_verification_token_0123456789";
    const PATH: &str = "/notifications/marketplace-account-deletion";
    const HOST: &str = "hooks.example.com";

    fn endpoint() -> DeletionEndpoint {
        DeletionEndpoint::new(TOKEN, PATH)
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 45).unwrap()
    }

    fn get(query: &[(&str, &str)]) -> InboundRequest {
        let mut request = InboundRequest::new(RequestMethod::Read).with_header("Host", HOST);
        for (name, value) in query {
            request = request.with_query(*name, *value);
        }
        request
    }

    fn post(body: &str) -> InboundRequest {
        InboundRequest::new(RequestMethod::Write)
            .with_header("Host", HOST)
            .with_body(body)
    }

    fn body(response: &EndpointResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    fn oracle(code: &str) -> String {
        let input = format!("{}{}https://{}{}", code, TOKEN, HOST, PATH);
        hex::encode(Sha256::digest(input.as_bytes()))
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn test_classify_routes() {
        assert!(matches!(
            classify(&get(&[("challenge_code", "abc")])),
            Route::Verification(_)
        ));
        assert_eq!(classify(&get(&[])), Route::Health);
        assert_eq!(classify(&get(&[("challenge_code", "")])), Route::Health);
        assert_eq!(classify(&post("{}")), Route::Notification);
        assert_eq!(
            classify(&InboundRequest::new(RequestMethod::Other("PUT".to_string()))),
            Route::Unsupported("PUT".to_string())
        );
    }

    #[test]
    fn test_classify_empty_token_is_absent() {
        let route = classify(&get(&[("challenge_code", "abc"), ("verification_token", "")]));
        assert_eq!(
            route,
            Route::Verification(VerificationChallenge {
                challenge_code: "abc".to_string(),
                supplied_token: None,
            })
        );
    }

    // =========================================================================
    // Verification
    // =========================================================================

    #[test]
    fn test_challenge_with_matching_token() {
        let response = endpoint().handle(
            &get(&[("challenge_code", "abc"), ("verification_token", TOKEN)]),
            fixed_time(),
        );

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(body(&response)["challengeResponse"], oracle("abc"));
    }

    #[test]
    fn test_challenge_without_token() {
        let response = endpoint().handle(&get(&[("challenge_code", "abc")]), fixed_time());

        assert_eq!(response.status, 200);
        assert_eq!(body(&response)["challengeResponse"], oracle("abc"));
    }

    #[test]
    fn test_challenge_with_wrong_token() {
        for code in ["abc", "0", "long-challenge-code-with-symbols-!@#"] {
            let response = endpoint().handle(
                &get(&[("challenge_code", code), ("verification_token", "wrong")]),
                fixed_time(),
            );

            assert_eq!(response.status, 401);
            assert_eq!(body(&response)["error"], "Invalid verification token");
            assert!(!response.body.contains(TOKEN));
        }
    }

    #[test]
    fn test_challenge_without_host() {
        let request = InboundRequest::new(RequestMethod::Read).with_query("challenge_code", "abc");
        let response = endpoint().handle(&request, fixed_time());

        assert_eq!(response.status, 400);
        assert_eq!(body(&response)["error"], "Missing host header");
    }

    #[test]
    fn test_challenge_host_header_case_insensitive() {
        let request = InboundRequest::new(RequestMethod::Read)
            .with_header("HOST", HOST)
            .with_query("challenge_code", "abc");
        let response = endpoint().handle(&request, fixed_time());

        assert_eq!(body(&response)["challengeResponse"], oracle("abc"));
    }

    // =========================================================================
    // Health
    // =========================================================================

    #[test]
    fn test_health_without_challenge() {
        let absent = endpoint().handle(&get(&[]), fixed_time());
        let empty = endpoint().handle(&get(&[("challenge_code", "")]), fixed_time());

        assert_eq!(absent.status, 200);
        assert_eq!(absent, empty);

        let status = body(&absent);
        assert_eq!(status["verification_token"], "configured");
        assert_eq!(status["endpoint_path"], PATH);
        assert!(!absent.body.contains(TOKEN));
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    #[test]
    fn test_notification_acknowledged() {
        let response = endpoint().handle(
            &post(r#"{"notification":{"notificationId":"abc123"}}"#),
            fixed_time(),
        );

        assert_eq!(response.status, 200);
        let ack = body(&response);
        assert_eq!(ack["status"], "received");
        assert_eq!(ack["notificationId"], "abc123");
        assert_eq!(ack["timestamp"], "2025-06-01T12:30:45.000Z");
    }

    #[test]
    fn test_notification_without_id() {
        let response = endpoint().handle(&post("{}"), fixed_time());

        assert_eq!(response.status, 200);
        assert_eq!(body(&response)["notificationId"], "unknown");
    }

    #[test]
    fn test_notification_whitespace_body() {
        let response = endpoint().handle(&post("   "), fixed_time());

        assert_eq!(response.status, 400);
        assert_eq!(response.body, r#"{"error":"Invalid notification format"}"#);
    }

    #[test]
    fn test_notification_unreadable_body() {
        for rejection in [BodyRejection::InvalidUtf8, BodyRejection::Unreadable] {
            let request = InboundRequest::new(RequestMethod::Write)
                .with_header("Host", HOST)
                .with_body_rejection(rejection);
            let response = endpoint().handle(&request, fixed_time());

            assert_eq!(response.status, 400);
            assert_eq!(response.content_type(), Some("application/json"));
            assert_eq!(response.body, r#"{"error":"Invalid notification format"}"#);
        }
    }

    #[test]
    fn test_unreadable_body_ignored_outside_notifications() {
        let delete = InboundRequest::new(RequestMethod::Other("DELETE".to_string()))
            .with_body_rejection(BodyRejection::InvalidUtf8);
        assert_eq!(endpoint().handle(&delete, fixed_time()).status, 405);

        let challenge =
            get(&[("challenge_code", "abc")]).with_body_rejection(BodyRejection::InvalidUtf8);
        let response = endpoint().handle(&challenge, fixed_time());
        assert_eq!(response.status, 200);
        assert_eq!(body(&response)["challengeResponse"], oracle("abc"));
    }

    #[test]
    fn test_notification_malformed() {
        let response = endpoint().handle(&post("not-json"), fixed_time());

        assert_eq!(response.status, 400);
        assert_eq!(response.body, r#"{"error":"Invalid notification format"}"#);
    }

    // =========================================================================
    // Rejection & Purity
    // =========================================================================

    #[test]
    fn test_unsupported_method() {
        let request = InboundRequest::new(RequestMethod::Other("DELETE".to_string()));
        let response = endpoint().handle(&request, fixed_time());

        assert_eq!(response.status, 405);
        assert_eq!(body(&response)["supported"], serde_json::json!(["GET", "POST"]));
    }

    #[test]
    fn test_identical_requests_identical_responses() {
        let endpoint = endpoint();
        let requests = [
            get(&[("challenge_code", "abc")]),
            get(&[("challenge_code", "abc"), ("verification_token", "wrong")]),
            get(&[]),
            post(r#"{"notification":{"notificationId":"abc123"}}"#),
            post("not-json"),
            InboundRequest::new(RequestMethod::Other("PATCH".to_string())),
        ];

        for request in &requests {
            let first = endpoint.handle(request, fixed_time());
            let second = endpoint.handle(request, fixed_time());
            assert_eq!(first, second);
        }
    }
}
