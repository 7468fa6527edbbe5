//! HTTP execution configuration.
//!
//! Controls how the underlying HTTP client is built: per-request timeout and
//! headers sent with every request.

use crate::config::RequestUtilsConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for HTTP request execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Request timeout in milliseconds.
    ///
    /// Covers connection, headers, and body download of a single request.
    pub timeout_ms: u64,

    /// Headers added to every request unless the request sets them itself.
    pub default_headers: HashMap<String, String>,
}

impl ExecutionConfig {
    /// Creates a new ExecutionConfig with the given timeout and no extra headers.
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            default_headers: HashMap::new(),
        }
    }

    /// Builds the execution settings out of the crate configuration.
    pub fn from_config(config: &RequestUtilsConfig) -> Self {
        Self {
            timeout_ms: config.timeout,
            default_headers: config.default_headers.clone(),
        }
    }

    /// Returns the timeout as a `Duration`.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::from_config(&RequestUtilsConfig::default())
    }
}
