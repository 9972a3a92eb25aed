//! Endpoint-ownership challenge verification.
//!
//! When the endpoint is registered, the marketplace sends
//! `GET <endpoint>?challenge_code=...` and expects back the SHA-256 hex digest
//! of `challenge_code + verification_token + endpoint_url`, where
//! `endpoint_url` is the full `https://` URL the challenge was sent to.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::error::EndpointError;

/// A challenge extracted from a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationChallenge {
    /// Challenge code sent by the marketplace (never empty)
    pub challenge_code: String,
    /// Token sent alongside the challenge, if any
    pub supplied_token: Option<String>,
}

/// Build the canonical endpoint URL from the host header and path suffix.
///
/// The host is used verbatim: no port stripping, no trailing-slash cleanup.
pub fn endpoint_url(host: &str, path: &str) -> String {
    format!("https://{}{}", host, path)
}

/// Pick the token that goes into the digest.
///
/// An absent token falls back to the configured one. A supplied token must
/// match the configured one exactly.
pub fn effective_token<'a>(
    supplied: Option<&str>,
    configured: &'a str,
) -> Result<&'a str, EndpointError> {
    match supplied {
        None => Ok(configured),
        Some(token) if tokens_match(token, configured) => Ok(configured),
        Some(token) => {
            warn!(
                supplied_length = token.len(),
                expected_length = configured.len(),
                "verification_token_mismatch"
            );
            Err(EndpointError::TokenMismatch)
        }
    }
}

/// Compute the challenge response: SHA-256(code + token + url) as lowercase hex.
pub fn challenge_response(challenge_code: &str, token: &str, endpoint_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(challenge_code.as_bytes());
    hasher.update(token.as_bytes());
    hasher.update(endpoint_url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a challenge and compute its response.
pub fn respond_to_challenge(
    challenge: &VerificationChallenge,
    configured_token: &str,
    host: &str,
    path: &str,
) -> Result<String, EndpointError> {
    let token = effective_token(challenge.supplied_token.as_deref(), configured_token)?;
    let url = endpoint_url(host, path);
    Ok(challenge_response(&challenge.challenge_code, token, &url))
}

/// Compare tokens without leaking the position of the first differing byte.
fn tokens_match(supplied: &str, configured: &str) -> bool {
    supplied.as_bytes().ct_eq(configured.as_bytes()).into()
}
