//! Cookie login against `wp-login.php`.
//!
//! A fresh login is three requests: the form post that sets the auth
//! cookies, the `rest-nonce` ajax action that returns the REST nonce, and a
//! HEAD of the site to discover the REST root from its `Link` header.

use super::{Authenticator, User};
use crate::executor::error::{Error, Result};
use crate::executor::native::HttpClient;
use crate::models::request::{HttpMethod, HttpRequest, RequestBody};
use crate::session::{merge_set_cookies, Cookie, SessionState};
use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Cookie WordPress expects to see before it accepts a login post.
const TEST_COOKIE: &str = "wordpress_test_cookie=WP%20Cookie%20check";

/// Prefix of the cookie that proves a logged-in session.
const LOGGED_IN_COOKIE_PREFIX: &str = "wordpress_logged_in";

static REST_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([^>]+)>;\s*rel="https://api\.w\.org/""#).expect("valid REST link regex")
});

/// Form-based WordPress login.
#[derive(Debug, Clone, Default)]
pub struct WpLogin;

impl WpLogin {
    pub fn new() -> Self {
        Self
    }

    async fn post_login_form(
        &self,
        http: &HttpClient,
        base_url: &Url,
        user: &User,
        domain: &str,
    ) -> Result<Vec<Cookie>> {
        let url = base_url.join("wp-login.php")?;
        let request = HttpRequest::new(HttpMethod::POST, url.as_str())
            .with_header("Cookie", TEST_COOKIE)
            .with_body(RequestBody::Form(vec![
                ("log".to_string(), user.username.clone()),
                ("pwd".to_string(), user.password.clone()),
                ("rememberme".to_string(), "forever".to_string()),
            ]));

        let response = http.execute(&request).await?;
        if response.status_code >= 500 {
            return Err(Error::Server {
                status: response.status_code,
                code: "login_failed".to_string(),
                message: "wp-login.php answered with a server error".to_string(),
            });
        }

        let mut cookies = Vec::new();
        merge_set_cookies(&mut cookies, &response.set_cookies, domain);

        let logged_in = cookies
            .iter()
            .any(|c| c.name.starts_with(LOGGED_IN_COOKIE_PREFIX));
        if !logged_in {
            return Err(Error::Authentication(format!(
                "login as '{}' was rejected (status {})",
                user.username, response.status_code
            )));
        }

        debug!("Login as '{}' set {} cookies", user.username, cookies.len());
        Ok(cookies)
    }

    async fn fetch_nonce(
        &self,
        http: &HttpClient,
        base_url: &Url,
        cookie_header: &str,
    ) -> Result<String> {
        let url = base_url.join("wp-admin/admin-ajax.php?action=rest-nonce")?;
        let request =
            HttpRequest::new(HttpMethod::GET, url.as_str()).with_header("Cookie", cookie_header);

        let response = http.execute(&request).await?;
        let nonce = response.text().trim().to_string();

        // admin-ajax answers "0" or "-1" to unauthenticated callers.
        if !response.is_success() || nonce.is_empty() || nonce == "0" || nonce == "-1" {
            return Err(Error::Authentication(format!(
                "failed to obtain a REST nonce (status {})",
                response.status_code
            )));
        }

        Ok(nonce)
    }
}

#[async_trait]
impl Authenticator for WpLogin {
    async fn authenticate(
        &self,
        http: &HttpClient,
        base_url: &Url,
        user: &User,
    ) -> Result<SessionState> {
        let domain = base_url.host_str().unwrap_or("localhost").to_string();

        let cookies = self.post_login_form(http, base_url, user, &domain).await?;
        let cookie_header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        let (nonce, root_url) = tokio::join!(
            self.fetch_nonce(http, base_url, &cookie_header),
            discover_rest_root(http, base_url)
        );

        let state = SessionState::new(cookies, nonce?, root_url?);
        state.validate().map_err(Error::Authentication)?;

        info!("Logged in as '{}' at {}", user.username, base_url);
        Ok(state)
    }
}

/// Finds the REST root advertised in the site's `Link` header.
pub async fn discover_rest_root(http: &HttpClient, base_url: &Url) -> Result<String> {
    let request = HttpRequest::new(HttpMethod::HEAD, base_url.as_str());
    let response = http.execute(&request).await?;

    let links = response.header("link").unwrap_or_default();
    parse_rest_link(links).ok_or_else(|| {
        Error::Configuration(format!(
            "Failed to discover REST API endpoint. Link header: {:?}",
            response.header("link")
        ))
    })
}

fn parse_rest_link(links: &str) -> Option<String> {
    REST_LINK
        .captures(links)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
