//! Session cookies.
//!
//! Cookies are stored in the same record shape browser automation tools use
//! for storage state files, so a snapshot written here can be fed to a
//! browser context as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    #[serde(rename = "None")]
    None,
    #[default]
    #[serde(rename = "Lax")]
    Lax,
    #[serde(rename = "Strict")]
    Strict,
}

/// A cookie held by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix timestamp in seconds; -1 marks a session cookie.
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSite,
}

fn default_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

impl Cookie {
    /// Creates a session cookie valid for the whole domain.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires: session_expiry(),
            http_only: false,
            secure: false,
            same_site: SameSite::default(),
        }
    }

    /// True if the cookie carries an expiry that lies in the past.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires >= 0.0 && self.expires <= now.timestamp() as f64
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Parses a raw `Set-Cookie` header value.
    ///
    /// `default_domain` is used when the header carries no `Domain`
    /// attribute. Returns `None` for headers without a `name=value` pair.
    pub fn parse_set_cookie(raw: &str, default_domain: &str) -> Option<Cookie> {
        let mut parts = raw.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim(), default_domain);
        let mut max_age: Option<i64> = None;

        for attribute in parts {
            let (key, val) = match attribute.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attribute.trim(), ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "domain" if !val.is_empty() => {
                    cookie.domain = val.trim_start_matches('.').to_string();
                }
                "path" if !val.is_empty() => cookie.path = val.to_string(),
                "expires" => {
                    if let Some(ts) = parse_cookie_date(val) {
                        cookie.expires = ts as f64;
                    }
                }
                "max-age" => max_age = val.parse().ok(),
                "httponly" => cookie.http_only = true,
                "secure" => cookie.secure = true,
                "samesite" => {
                    cookie.same_site = match val.to_ascii_lowercase().as_str() {
                        "strict" => SameSite::Strict,
                        "none" => SameSite::None,
                        _ => SameSite::Lax,
                    }
                }
                _ => {}
            }
        }

        // Max-Age takes precedence over Expires.
        if let Some(seconds) = max_age {
            cookie.expires = if seconds <= 0 {
                0.0
            } else {
                (Utc::now().timestamp() + seconds) as f64
            };
        }

        Some(cookie)
    }
}

/// Parses cookie dates in both `Wed, 21 Oct 2026 07:28:00 GMT` and the
/// dashed `Wed, 21-Oct-2026 07:28:00 GMT` form PHP emits.
fn parse_cookie_date(raw: &str) -> Option<i64> {
    let normalized = raw.replace('-', " ");
    DateTime::parse_from_rfc2822(&normalized)
        .ok()
        .map(|dt| dt.timestamp())
}
