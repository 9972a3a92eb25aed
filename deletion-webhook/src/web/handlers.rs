//! HTTP handlers.
//!
//! These handlers only translate between axum and the endpoint:
//! 1. Normalize the HTTP request into an `InboundRequest`
//! 2. Call `DeletionEndpoint::handle_now`
//! 3. Write the returned response out as-is
//!
//! The body is read as raw bytes so that an oversized or non-UTF-8 body
//! still reaches the endpoint, which answers it in its own JSON format.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::endpoint::{
    BodyRejection, DeletionEndpoint, EndpointResponse, Headers, InboundRequest, RequestMethod,
};
use crate::Config;

/// Largest request body read into memory.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Router state: the endpoint, built once from configuration.
#[derive(Clone)]
pub struct AppState {
    pub endpoint: Arc<DeletionEndpoint>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let Config {
            verification_token,
            endpoint_path,
            ..
        } = config;

        Self {
            endpoint: Arc::new(DeletionEndpoint::new(verification_token, endpoint_path)),
        }
    }

    /// Path the endpoint route is mounted at.
    pub fn endpoint_path(&self) -> &str {
        self.endpoint.endpoint_path()
    }
}

/// Body of the `/health` check.
#[derive(Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// `/health`: the process is up. Says nothing about the endpoint itself.
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

/// Account deletion endpoint. Accepts every method; the endpoint decides.
pub async fn account_deletion(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            warn!(error = %e, limit = MAX_BODY_BYTES, "request_body_unreadable");
            BodyRejection::Unreadable
        });

    let request = to_inbound_request(&method, &uri, &headers, body);

    debug!(
        method = %method,
        has_query = !request.query.is_empty(),
        body_length = request.body.as_ref().map(|b| b.len()).unwrap_or(0),
        body_rejection = ?request.body_rejection,
        "account_deletion_request_received"
    );

    into_http_response(state.endpoint.handle_now(&request))
}

/// Normalize an HTTP request for the endpoint.
///
/// HTTP/2 requests carry the host in the URI authority rather than a `Host`
/// header, so the authority stands in when the header is missing.
pub fn to_inbound_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Result<Bytes, BodyRejection>,
) -> InboundRequest {
    let query = Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(query)| query)
        .unwrap_or_default();

    let mut inbound_headers: Headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    if inbound_headers.get("host").is_none() {
        if let Some(authority) = uri.authority() {
            inbound_headers.insert("host", authority.as_str());
        }
    }

    let (body, body_rejection) = match body.and_then(decode_body) {
        Ok(body) => (body, None),
        Err(rejection) => (None, Some(rejection)),
    };

    InboundRequest {
        method: RequestMethod::from_http(method.as_str()),
        query,
        headers: inbound_headers,
        body,
        body_rejection,
    }
}

/// Empty bodies become `None`; anything else must be UTF-8.
fn decode_body(bytes: Bytes) -> Result<Option<String>, BodyRejection> {
    if bytes.is_empty() {
        return Ok(None);
    }

    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|_| BodyRejection::InvalidUtf8)
}

/// Write an endpoint response out as an HTTP response.
pub fn into_http_response(response: EndpointResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or_else(|_| {
        error!(status = response.status, "response_status_invalid");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut http_response = (status, response.body).into_response();
    let http_headers = http_response.headers_mut();

    for (name, value) in &response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                http_headers.insert(name, value);
            }
            _ => error!(header = %name, "response_header_invalid"),
        }
    }

    if !http_headers.contains_key(header::CONTENT_TYPE) {
        http_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }

    http_response
}
