//! Authenticated session state.
//!
//! A [`SessionState`] is the cookie set plus the REST nonce and REST root URL
//! captured by a login (or restored from a snapshot file). It is replaced
//! wholesale on re-login and never edited in place by REST calls.

pub mod cookie;
pub mod storage;

pub use cookie::{Cookie, SameSite};
pub use storage::{load_storage_state, save_storage_state};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a session owned by an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, nothing attempted yet.
    Uninitialized,
    /// A login or restore is in flight.
    Authenticating,
    /// A valid session is available.
    Ready,
    /// The last establishment attempt was rejected.
    Failed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Authenticating => "authenticating",
            SessionPhase::Ready => "ready",
            SessionPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Cookies, nonce, and REST root of an authenticated session.
///
/// Serialized with the field names of the snapshot file:
/// `{"cookies": [...], "nonce": "...", "rootURL": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: Vec<Cookie>,
    pub nonce: String,
    #[serde(rename = "rootURL")]
    pub root_url: String,
}

impl SessionState {
    pub fn new(cookies: Vec<Cookie>, nonce: impl Into<String>, root_url: impl Into<String>) -> Self {
        Self {
            cookies,
            nonce: nonce.into(),
            root_url: root_url.into(),
        }
    }

    /// A session is usable only with a nonce and at least one cookie.
    pub fn validate(&self) -> Result<(), String> {
        if self.nonce.trim().is_empty() {
            return Err("session nonce is empty".to_string());
        }
        if self.cookies.is_empty() {
            return Err("session has no cookies".to_string());
        }
        if self.root_url.trim().is_empty() {
            return Err("session rootURL is empty".to_string());
        }
        Ok(())
    }

    /// Renders the live cookies as a single `Cookie` header value.
    ///
    /// Returns `None` when every cookie has expired.
    pub fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| !c.is_expired())
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// True if any cookie name starts with `prefix`.
    pub fn has_cookie_prefix(&self, prefix: &str) -> bool {
        self.cookies
            .iter()
            .any(|c| c.name.starts_with(prefix) && !c.is_expired())
    }
}

/// Folds `Set-Cookie` headers into a cookie list.
///
/// A cookie replaces any existing one with the same name and path; an
/// already-expired cookie removes it instead.
pub fn merge_set_cookies<'a, I>(cookies: &mut Vec<Cookie>, headers: I, default_domain: &str)
where
    I: IntoIterator<Item = &'a String>,
{
    for raw in headers {
        let Some(cookie) = Cookie::parse_set_cookie(raw, default_domain) else {
            continue;
        };
        cookies.retain(|c| !(c.name == cookie.name && c.path == cookie.path));
        if !cookie.is_expired() {
            cookies.push(cookie);
        }
    }
}
