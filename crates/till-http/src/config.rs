//! # Backend Configuration
//!
//! Connection settings and credentials for the store backend API.
//!
//! The bearer token comes from whatever login flow opened the terminal and
//! is passed in explicitly; nothing in this crate consults a global session
//! store at request time.

use std::env;
use till_core::{TerminalError, TerminalResult};

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Bearer credential for the store backend.
#[derive(Debug, Clone)]
pub struct AuthContext {
    token: String,
}

impl AuthContext {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Load the credential from the `TILL_API_TOKEN` environment variable.
    pub fn from_env() -> TerminalResult<Self> {
        dotenvy::dotenv().ok();

        let token = env::var("TILL_API_TOKEN")
            .map_err(|_| TerminalError::Configuration("TILL_API_TOKEN not set".to_string()))?;
        if token.trim().is_empty() {
            return Err(TerminalError::Configuration(
                "TILL_API_TOKEN is empty".to_string(),
            ));
        }

        Ok(Self { token })
    }

    /// `Authorization` header value sent on every request.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Store backend connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend, kept without a trailing slash
    pub base_url: String,
    /// Per-request timeout; a stalled backend must not wedge the terminal
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load from environment variables.
    ///
    /// `TILL_BACKEND_URL` is required; `TILL_HTTP_TIMEOUT_SECS` optionally
    /// overrides the request timeout and must be a whole number of seconds
    /// when set.
    pub fn from_env() -> TerminalResult<Self> {
        dotenvy::dotenv().ok();

        let base_url = env::var("TILL_BACKEND_URL")
            .map_err(|_| TerminalError::Configuration("TILL_BACKEND_URL not set".to_string()))?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(TerminalError::Configuration(format!(
                "TILL_BACKEND_URL must start with http:// or https://, got: {base_url}"
            )));
        }

        let timeout_secs = match env::var("TILL_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                TerminalError::Configuration(format!(
                    "TILL_HTTP_TIMEOUT_SECS must be a whole number of seconds, got: {raw}"
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url: trim_base_url(base_url),
            timeout_secs,
        })
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
