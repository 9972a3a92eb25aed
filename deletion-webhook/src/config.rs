//! Configuration module for environment variable parsing.
//!
//! The verification token is a secret shared with the marketplace when the
//! endpoint is registered. It is read from `VERIFICATION_TOKEN_FILE` (a
//! mounted secret) or `VERIFICATION_TOKEN`, never compiled in.

use std::{env, fmt, fs};

use thiserror::Error;
use tracing::warn;

/// Path the endpoint is served at when `ENDPOINT_PATH` is not set.
pub const DEFAULT_ENDPOINT_PATH: &str = "/notifications/marketplace-account-deletion";

/// Configuration errors. All of them are fatal at start-up.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("verification token is not configured (set VERIFICATION_TOKEN or VERIFICATION_TOKEN_FILE)")]
    MissingToken,

    #[error("failed to read verification token file {path}: {source}")]
    TokenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ENDPOINT_PATH must start with '/' and must not be /health, got {0:?}")]
    InvalidEndpointPath(String),
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Expected verification token
    pub verification_token: String,

    /// Path suffix the endpoint is reachable at, used in the challenge URL
    pub endpoint_path: String,

    /// Port for the web server to listen on
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let verification_token = load_token(&lookup)?;

        let endpoint_path = lookup("ENDPOINT_PATH")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT_PATH.to_string());

        if !endpoint_path.starts_with('/') || endpoint_path == "/health" {
            return Err(ConfigError::InvalidEndpointPath(endpoint_path));
        }

        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(env_var = "PORT", value = %raw, "Invalid port, using default");
                8080
            }),
            None => 8080,
        };

        Ok(Config {
            verification_token,
            endpoint_path,
            port,
        })
    }
}

// Keep the secret out of logs and panic messages.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("verification_token", &"<redacted>")
            .field("endpoint_path", &self.endpoint_path)
            .field("port", &self.port)
            .finish()
    }
}

/// Resolve the token, preferring the secret file over the plain variable.
fn load_token<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup("VERIFICATION_TOKEN_FILE").filter(|p| !p.trim().is_empty()) {
        Some(path) => fs::read_to_string(path.trim()).map_err(|source| ConfigError::TokenFile {
            path: path.clone(),
            source,
        })?,
        None => lookup("VERIFICATION_TOKEN").ok_or(ConfigError::MissingToken)?,
    };

    // Secret files usually end with a newline; the token itself never does.
    let token = raw.trim_end_matches(['\r', '\n']).to_string();
    if token.is_empty() {
        return Err(ConfigError::MissingToken);
    }

    Ok(token)
}
