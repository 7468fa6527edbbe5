//! REST capability.
//!
//! [`RestApi`] is what fixture operations are written against. [`RestClient`]
//! implements it over HTTP: it owns the current session, attaches its
//! cookies and nonce to every call, transparently re-logs in once when the
//! nonce has gone stale, and splits batches to the server's maximum size.

pub mod batch;

pub use batch::{plan_chunks, DEFAULT_MAX_BATCH_SIZE};

use crate::auth::{Authenticator, User};
use crate::executor::error::{Error, Result};
use crate::executor::native::HttpClient;
use crate::models::request::{
    batch_envelope, BatchRequest, HttpMethod, HttpRequest, RequestBody, RestRequest,
};
use crate::models::response::{BatchItem, BatchResponse, ChunkStatus, HttpResponse};
use crate::session::{save_storage_state, SessionPhase, SessionState};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use url::Url;

/// Error code WordPress returns when the `X-WP-Nonce` header is stale.
pub const INVALID_NONCE_CODE: &str = "rest_cookie_invalid_nonce";

/// Single and batched calls against the REST API.
#[async_trait]
pub trait RestApi: Send + Sync {
    /// Executes one call and returns the decoded JSON body.
    async fn rest(&self, request: RestRequest) -> Result<Value>;

    /// Executes calls through the batch endpoint, in submission order.
    async fn batch_rest(&self, requests: Vec<BatchRequest>) -> Result<BatchResponse>;

    /// Maximum number of calls the server accepts per batch.
    async fn max_batch_size(&self) -> Result<usize>;

    /// Fetches an authenticated `wp-admin/` page as HTML.
    async fn admin_page(&self, path: &str) -> Result<String>;
}

#[async_trait]
impl<T: RestApi + ?Sized> RestApi for Arc<T> {
    async fn rest(&self, request: RestRequest) -> Result<Value> {
        (**self).rest(request).await
    }

    async fn batch_rest(&self, requests: Vec<BatchRequest>) -> Result<BatchResponse> {
        (**self).batch_rest(requests).await
    }

    async fn max_batch_size(&self) -> Result<usize> {
        (**self).max_batch_size().await
    }

    async fn admin_page(&self, path: &str) -> Result<String> {
        (**self).admin_page(path).await
    }
}

/// HTTP implementation of [`RestApi`].
pub struct RestClient {
    http: HttpClient,
    base_url: Url,
    user: User,
    authenticator: Arc<dyn Authenticator>,
    storage_state_path: Option<PathBuf>,
    session: RwLock<Option<SessionState>>,
    relogin: Mutex<()>,
    max_batch_size: OnceCell<usize>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("user", &self.user)
            .field("storage_state_path", &self.storage_state_path)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub fn new(
        http: HttpClient,
        base_url: Url,
        user: User,
        authenticator: Arc<dyn Authenticator>,
        storage_state_path: Option<PathBuf>,
    ) -> Self {
        Self {
            http,
            base_url,
            user,
            authenticator,
            storage_state_path,
            session: RwLock::new(None),
            relogin: Mutex::new(()),
            max_batch_size: OnceCell::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// A copy of the current session, if one is installed.
    pub async fn session(&self) -> Option<SessionState> {
        self.session.read().await.clone()
    }

    /// Installs a session without any network traffic.
    pub async fn install_session(&self, state: SessionState) {
        *self.session.write().await = Some(state);
    }

    /// Performs a fresh login, installs the session, and persists it when a
    /// snapshot path is configured.
    pub async fn login(&self) -> Result<SessionState> {
        let state = self.fresh_session().await?;
        if let Some(path) = &self.storage_state_path {
            persist(path.clone(), state.clone()).await?;
        }
        Ok(state)
    }

    async fn fresh_session(&self) -> Result<SessionState> {
        let state = self
            .authenticator
            .authenticate(&self.http, &self.base_url, &self.user)
            .await?;
        state.validate().map_err(Error::Authentication)?;

        self.install_session(state.clone()).await;
        Ok(state)
    }

    /// Re-logs in unless another caller already replaced `stale_nonce`.
    async fn relogin_after(&self, stale_nonce: &str) -> Result<SessionState> {
        let _guard = self.relogin.lock().await;
        if let Some(current) = self.session().await {
            if current.nonce != stale_nonce {
                debug!("Session already refreshed by another caller");
                return Ok(current);
            }
        }
        warn!("REST nonce rejected, logging in again as '{}'", self.user.username);
        let state = self.fresh_session().await?;
        // The retried call only needs the in-memory session.
        if let Some(path) = &self.storage_state_path {
            if let Err(e) = persist(path.clone(), state.clone()).await {
                warn!("Could not save refreshed session to {}: {}", path.display(), e);
            }
        }
        Ok(state)
    }

    async fn current(&self) -> Result<SessionState> {
        self.session()
            .await
            .ok_or(Error::SessionNotReady(SessionPhase::Uninitialized))
    }

    async fn send(&self, state: &SessionState, request: &RestRequest) -> Result<HttpResponse> {
        let url = rest_url(&state.root_url, &request.path, &request.params)?;
        let mut http_request = HttpRequest::new(request.method, url)
            .with_header("Accept", "application/json")
            .with_header("X-WP-Nonce", state.nonce.clone());
        if let Some(cookies) = state.cookie_header() {
            http_request = http_request.with_header("Cookie", cookies);
        }
        for (name, value) in &request.headers {
            http_request = http_request.with_header(name.clone(), value.clone());
        }
        if let Some(data) = &request.data {
            http_request = http_request.with_body(RequestBody::Json(data.clone()));
        }
        self.http.execute(&http_request).await
    }

    /// Sends a request, re-logging in and retrying once on a stale nonce.
    async fn send_with_relogin(&self, request: &RestRequest) -> Result<(HttpResponse, Value)> {
        let state = self.current().await?;
        let response = self.send(&state, request).await?;
        let body = decode_body(&response)?;

        let stale_nonce = response.status_code == 403
            && body.get("code").and_then(|c| c.as_str()) == Some(INVALID_NONCE_CODE);
        if stale_nonce {
            let fresh = self.relogin_after(&state.nonce).await?;
            let response = self.send(&fresh, request).await?;
            let body = decode_body(&response)?;
            return Ok((response, body));
        }

        Ok((response, body))
    }

    async fn fetch_max_batch_size(&self) -> Result<usize> {
        let request = RestRequest::new(HttpMethod::OPTIONS, "batch/v1");
        let (response, body) = self.send_with_relogin(&request).await?;
        if !response.is_success() {
            return Err(Error::from_envelope(response.status_code, &body));
        }
        let max = batch::max_items_from_options(&body);
        info!("Server accepts up to {} requests per batch", max);
        Ok(max)
    }

    async fn send_chunk(
        &self,
        chunk: &[BatchRequest],
        max: usize,
    ) -> Result<Vec<Result<BatchItem>>> {
        let request = RestRequest::new(HttpMethod::POST, "batch/v1").data(batch_envelope(chunk));
        let (response, body) = self.send_with_relogin(&request).await?;

        if !response.is_success() {
            return Err(batch::chunk_rejection(
                response.status_code,
                &body,
                max,
                chunk.len(),
            ));
        }
        batch::decode_chunk(&body, chunk.len())
    }
}

#[async_trait]
impl RestApi for RestClient {
    async fn rest(&self, request: RestRequest) -> Result<Value> {
        let (response, body) = self.send_with_relogin(&request).await?;
        if !response.is_success() {
            return Err(Error::from_envelope(response.status_code, &body));
        }
        Ok(body)
    }

    async fn batch_rest(&self, requests: Vec<BatchRequest>) -> Result<BatchResponse> {
        if requests.is_empty() {
            return Ok(BatchResponse::default());
        }

        let max = self.max_batch_size().await?;
        let mut response = BatchResponse::default();

        for range in plan_chunks(requests.len(), max) {
            let chunk = &requests[range.clone()];
            match self.send_chunk(chunk, max).await {
                Ok(items) => {
                    response.items.extend(items);
                    response.chunks.push(ChunkStatus {
                        offset: range.start,
                        len: range.len(),
                        outcome: Ok(()),
                    });
                }
                Err(err) => {
                    warn!(
                        "Batch chunk {}..{} failed: {}",
                        range.start, range.end, err
                    );
                    response
                        .items
                        .extend(std::iter::repeat(Err(err.clone())).take(range.len()));
                    response.chunks.push(ChunkStatus {
                        offset: range.start,
                        len: range.len(),
                        outcome: Err(err),
                    });
                }
            }
        }

        Ok(response)
    }

    async fn max_batch_size(&self) -> Result<usize> {
        self.max_batch_size
            .get_or_try_init(|| self.fetch_max_batch_size())
            .await
            .copied()
    }

    async fn admin_page(&self, path: &str) -> Result<String> {
        let state = self.current().await?;
        let url = self.base_url.join("wp-admin/")?.join(path.trim_start_matches('/'))?;

        let mut request = HttpRequest::new(HttpMethod::GET, url.as_str());
        if let Some(cookies) = state.cookie_header() {
            request = request.with_header("Cookie", cookies);
        }

        // Admin actions answer with a redirect, which is not followed.
        let response = self.http.execute(&request).await?;
        if response.status_code >= 400 {
            return Err(Error::Server {
                status: response.status_code,
                code: "admin_page_failed".to_string(),
                message: format!("GET wp-admin/{} failed", path.trim_start_matches('/')),
            });
        }
        Ok(response.text())
    }
}

/// Joins a REST path onto the root URL and appends query parameters.
///
/// Handles both pretty-permalink roots (`…/wp-json/`) and plain roots
/// (`…/?rest_route=/`), where the path's own query must be joined with `&`.
pub fn rest_url(root_url: &str, path: &str, params: &[(String, String)]) -> Result<String> {
    let relative = path.trim_start_matches('/');
    let joined = if root_url.contains("rest_route=") {
        format!("{}{}", root_url, relative.replacen('?', "&", 1))
    } else {
        format!("{}{}", root_url, relative)
    };

    let mut url = Url::parse(&joined)?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
    }
    Ok(url.to_string())
}

/// Decodes a JSON body. Error pages that are not JSON (a PHP fatal, a proxy
/// error page) are kept as text so the status still surfaces as a server
/// error.
fn decode_body(response: &HttpResponse) -> Result<Value> {
    match response.json() {
        Ok(body) => Ok(body),
        Err(_) if !response.is_success() => Ok(Value::String(response.text())),
        Err(err) => Err(err),
    }
}

async fn persist(path: PathBuf, state: SessionState) -> Result<()> {
    tokio::task::spawn_blocking(move || save_storage_state(&path, &state))
        .await
        .map_err(|e| Error::Configuration(format!("Session snapshot writer panicked: {}", e)))?
}
