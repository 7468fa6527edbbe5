//! HTTP executor backed by reqwest.
//!
//! The client never follows redirects: the login flow needs to see the
//! `Set-Cookie` headers of the 302 that `wp-login.php` answers with.

use crate::executor::config::ExecutionConfig;
use crate::executor::error::{Error, Result};
use crate::models::request::{HttpMethod, HttpRequest, RequestBody};
use crate::models::response::HttpResponse;
use log::debug;
use std::collections::HashMap;
use std::time::Instant;

/// Thin wrapper around a configured `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ExecutionConfig,
}

impl HttpClient {
    /// Builds a client from the execution settings.
    pub fn new(config: ExecutionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout_duration())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Executes one request and reads the full body.
    ///
    /// Non-2xx statuses are returned as responses, not errors; only
    /// transport failures and timeouts are errors here.
    pub async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let start_time = Instant::now();

        let method = match request.method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
            HttpMethod::HEAD => reqwest::Method::HEAD,
        };

        let url = reqwest::Url::parse(&request.url)?;
        let mut req_builder = self.client.request(method, url);

        for (name, value) in &self.config.default_headers {
            if request.header(name).is_none() {
                req_builder = req_builder.header(name, value);
            }
        }
        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        req_builder = match &request.body {
            Some(RequestBody::Json(value)) => req_builder.json(value),
            Some(RequestBody::Form(fields)) => req_builder.form(fields),
            None => req_builder,
        };

        let response = req_builder.send().await?;

        let status_code = response.status().as_u16();

        let mut headers: HashMap<String, String> = HashMap::new();
        let mut set_cookies = Vec::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else {
                continue;
            };
            if *name == reqwest::header::SET_COOKIE {
                set_cookies.push(value.to_string());
                continue;
            }
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let body = response.bytes().await?.to_vec();
        let duration = start_time.elapsed();

        debug!(
            "{} {} -> {} ({} bytes, {:?})",
            request.method,
            request.url,
            status_code,
            body.len(),
            duration
        );

        Ok(HttpResponse {
            status_code,
            headers,
            set_cookies,
            body,
            duration,
        })
    }
}
