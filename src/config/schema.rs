//! Configuration schema.
//!
//! Defines every user-configurable setting and its validation rules.

use crate::auth::User;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure.
///
/// Missing settings fall back to the defaults of a local `wp-env`
/// development site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUtilsConfig {
    /// Base URL of the site, e.g. `http://localhost:8889`.
    ///
    /// `wp-login.php` and `wp-admin/` are resolved against it. Defaults to
    /// `http://localhost:8889`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Credentials used for a fresh login.
    #[serde(default)]
    pub user: User,

    /// Where the session snapshot is read from and written to.
    ///
    /// When set and the file exists, the session is restored from it and no
    /// login happens. When set and the file is missing, a fresh session is
    /// written there. Defaults to none (always log in, never persist).
    #[serde(default)]
    pub storage_state_path: Option<PathBuf>,

    /// Request timeout in milliseconds. Defaults to 30000.
    ///
    /// Must be greater than 0.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Headers added to every request.
    #[serde(default)]
    pub default_headers: HashMap<String, String>,
}

impl Default for RequestUtilsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user: User::default(),
            storage_state_path: None,
            timeout: default_timeout(),
            default_headers: HashMap::new(),
        }
    }
}

impl RequestUtilsConfig {
    /// Validates the configuration and returns a message for the first
    /// invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == 0 {
            return Err("timeout must be greater than 0".to_string());
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| format!("baseUrl is not a valid URL: {}", e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "baseUrl must use http or https, got '{}'",
                url.scheme()
            ));
        }

        if self.user.username.trim().is_empty() {
            return Err("user.username must not be empty".to_string());
        }

        if let Some(path) = &self.storage_state_path {
            if path.as_os_str().is_empty() {
                return Err("storageStatePath must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Merges another configuration into this one.
    ///
    /// Settings in `other` that differ from the defaults win.
    pub fn merge(&self, other: &RequestUtilsConfig) -> RequestUtilsConfig {
        let defaults = RequestUtilsConfig::default();
        let mut merged = self.clone();

        if other.base_url != defaults.base_url {
            merged.base_url = other.base_url.clone();
        }
        if other.user != defaults.user {
            merged.user = other.user.clone();
        }
        if other.storage_state_path.is_some() {
            merged.storage_state_path = other.storage_state_path.clone();
        }
        if other.timeout != defaults.timeout {
            merged.timeout = other.timeout;
        }
        for (name, value) in &other.default_headers {
            merged.default_headers.insert(name.clone(), value.clone());
        }

        merged
    }

    /// Base URL parsed and normalized with a trailing slash so relative
    /// joins (`wp-login.php`) land under it.
    pub fn base_url(&self) -> Result<url::Url, url::ParseError> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        url::Url::parse(&raw)
    }
}

fn default_base_url() -> String {
    "http://localhost:8889".to_string()
}

fn default_timeout() -> u64 {
    30_000
}
