//! Error types for session, REST, and fixture operations.
//!
//! Every failure that reaches a caller is one of these variants. Payloads are
//! plain strings so an error can be cloned into each item of a failed batch
//! chunk.

use crate::session::SessionPhase;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the remote server.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The server rejected the credentials or the login flow did not yield a
    /// usable session.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network-level failure: connection refused, DNS, broken body stream.
    #[error("Network error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a 4xx/5xx status.
    #[error("Server error {status} ({code}): {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },

    /// Invalid configuration, or a missing/corrupt persisted session file.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The server refused a batch even after splitting it to the advertised
    /// maximum size.
    #[error("Batch of {attempted} requests rejected (server maximum is {max})")]
    CapabilityMismatch { max: usize, attempted: usize },

    /// No installed plugin matches the slug, even after a registry refresh.
    #[error("The plugin \"{0}\" isn't installed")]
    PluginNotFound(String),

    /// No installed theme matches the slug, even after a registry refresh.
    #[error("The theme \"{0}\" isn't installed")]
    ThemeNotFound(String),

    /// The server answered successfully but the body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// An operation was attempted before the session reached `Ready`.
    #[error("Session is not ready (phase: {0})")]
    SessionNotReady(SessionPhase),
}

impl Error {
    /// Returns true for failures that never reached the application layer.
    ///
    /// Callers may retry idempotent reads on these; the crate itself never
    /// retries.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout)
    }

    /// Returns the WordPress error code for server failures.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Server { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Builds a server error from a WordPress error envelope
    /// (`{"code": ..., "message": ..., "data": {"status": ...}}`).
    pub fn from_envelope(status: u16, body: &serde_json::Value) -> Self {
        let code = body
            .get("code")
            .and_then(|c| c.as_str())
            .unwrap_or("unknown_error")
            .to_string();
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| match body {
                serde_json::Value::Null => "empty response body".to_string(),
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            });

        Error::Server {
            status,
            code,
            message,
        }
    }
}

/// Maps reqwest errors the same way for every call site.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Transport(format!("Connection failed: {}", err))
        } else if err.is_builder() {
            Error::Configuration(format!("Invalid request: {}", err))
        } else if err.is_decode() {
            Error::InvalidResponse(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Configuration(format!("Invalid URL: {}", err))
    }
}
