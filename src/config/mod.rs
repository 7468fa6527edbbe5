//! Configuration loading.
//!
//! Configuration comes from a JSON settings object (under the
//! `"wp-request-utils"` key) and from `WP_*` environment variables, merged
//! over the defaults and validated before use.

pub mod schema;

pub use schema::RequestUtilsConfig;

use crate::auth::User;
use crate::executor::error::{Error, Result};
use log::warn;
use serde_json::Value;
use std::path::PathBuf;

/// Key under which settings are looked up in a JSON settings object.
pub const SETTINGS_KEY: &str = "wp-request-utils";

/// Base URL of the site.
pub const ENV_BASE_URL: &str = "WP_BASE_URL";
/// Login name.
pub const ENV_USERNAME: &str = "WP_USERNAME";
/// Login password.
pub const ENV_PASSWORD: &str = "WP_PASSWORD";
/// Session snapshot path.
pub const ENV_STORAGE_STATE_PATH: &str = "WP_STORAGE_STATE_PATH";

/// Loads configuration from a JSON settings value.
///
/// Settings under [`SETTINGS_KEY`] are merged over the defaults. Settings
/// that fail to deserialize are ignored with a warning; settings that
/// deserialize but fail validation are an error.
///
/// # Example
///
/// ```
/// use wp_request_utils::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "wp-request-utils": {
///         "baseUrl": "http://localhost:8888",
///         "timeout": 60000
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.timeout, 60000);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<RequestUtilsConfig> {
    let mut config = RequestUtilsConfig::default();

    if let Some(settings) = settings_json {
        if let Some(user_settings) = settings.get(SETTINGS_KEY) {
            match serde_json::from_value::<RequestUtilsConfig>(user_settings.clone()) {
                Ok(user_config) => {
                    config = config.merge(&user_config);
                }
                Err(e) => {
                    warn!(
                        "Failed to parse {} settings: {}. Using defaults.",
                        SETTINGS_KEY, e
                    );
                }
            }
        }
    }

    config
        .validate()
        .map_err(|e| Error::Configuration(format!("Invalid configuration: {}", e)))?;

    Ok(config)
}

/// Overlays `WP_*` environment variables onto a configuration.
pub fn apply_env(config: RequestUtilsConfig) -> Result<RequestUtilsConfig> {
    apply_env_with(config, |name| std::env::var(name).ok())
}

/// Same as [`apply_env`], reading variables through `lookup`.
pub fn apply_env_with<F>(mut config: RequestUtilsConfig, lookup: F) -> Result<RequestUtilsConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(base_url) = non_empty(ENV_BASE_URL) {
        config.base_url = base_url;
    }
    if non_empty(ENV_USERNAME).is_some() || non_empty(ENV_PASSWORD).is_some() {
        config.user = User::new(
            non_empty(ENV_USERNAME).unwrap_or_else(|| config.user.username.clone()),
            non_empty(ENV_PASSWORD).unwrap_or_else(|| config.user.password.clone()),
        );
    }
    if let Some(path) = non_empty(ENV_STORAGE_STATE_PATH) {
        config.storage_state_path = Some(PathBuf::from(path));
    }

    config
        .validate()
        .map_err(|e| Error::Configuration(format!("Invalid configuration: {}", e)))?;

    Ok(config)
}
