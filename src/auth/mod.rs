//! Login capability.
//!
//! The orchestrator never logs in by itself: it asks an [`Authenticator`]
//! for a fresh [`SessionState`]. [`WpLogin`] is the real implementation;
//! tests inject their own to count or fail logins.
//!
//! [`SessionState`]: crate::session::SessionState

pub mod login;

pub use login::{discover_rest_root, WpLogin};

use crate::executor::error::Result;
use crate::executor::native::HttpClient;
use crate::session::SessionState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Login credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for User {
    /// The administrator account of a stock development site.
    fn default() -> Self {
        Self::new("admin", "password")
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Exchanges credentials for an authenticated session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Performs a fresh login against the site at `base_url`.
    ///
    /// Rejected credentials surface as `Error::Authentication`.
    async fn authenticate(
        &self,
        http: &HttpClient,
        base_url: &Url,
        user: &User,
    ) -> Result<SessionState>;
}
