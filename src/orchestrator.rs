//! The `RequestUtils` orchestrator.
//!
//! Owns one REST client, one pair of registry snapshots, and the session
//! lifecycle:
//!
//! ```text
//! Uninitialized ──establish──▶ Authenticating ──ok──▶ Ready
//!                                    │
//!                                    └──err──▶ Failed ──establish──▶ …
//! ```
//!
//! Every REST or fixture call requires `Ready`.

use crate::auth::{Authenticator, WpLogin};
use crate::config::RequestUtilsConfig;
use crate::executor::config::ExecutionConfig;
use crate::executor::error::{Error, Result};
use crate::executor::native::HttpClient;
use crate::fixtures::Fixtures;
use crate::models::request::{BatchRequest, RestRequest};
use crate::models::response::BatchResponse;
use crate::rest::{RestApi, RestClient};
use crate::session::{load_storage_state, SessionPhase, SessionState};
use log::{error, info};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Builds a [`RequestUtils`] with non-default collaborators.
pub struct RequestUtilsBuilder {
    config: RequestUtilsConfig,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl RequestUtilsBuilder {
    /// Replaces the wp-login.php flow.
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Validates the configuration and assembles an uninitialized instance.
    pub fn build(self) -> Result<RequestUtils> {
        let config = self.config;
        config.validate().map_err(Error::Configuration)?;

        let base_url = config.base_url()?;
        let http = HttpClient::new(ExecutionConfig::from_config(&config))?;
        let authenticator = self
            .authenticator
            .unwrap_or_else(|| Arc::new(WpLogin::new()));

        let client = Arc::new(RestClient::new(
            http,
            base_url,
            config.user.clone(),
            authenticator,
            config.storage_state_path.clone(),
        ));

        Ok(RequestUtils {
            fixtures: Fixtures::new(Arc::clone(&client)),
            client,
            config,
            phase: RwLock::new(SessionPhase::Uninitialized),
        })
    }
}

/// Authenticated handle on a WordPress site for test setup and teardown.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct RequestUtils {
    config: RequestUtilsConfig,
    client: Arc<RestClient>,
    fixtures: Fixtures<Arc<RestClient>>,
    phase: RwLock<SessionPhase>,
}

impl std::fmt::Debug for RequestUtils {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestUtils")
            .field("config", &self.config)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl RequestUtils {
    pub fn builder(config: RequestUtilsConfig) -> RequestUtilsBuilder {
        RequestUtilsBuilder {
            config,
            authenticator: None,
        }
    }

    /// Builds an instance and establishes its session.
    ///
    /// Restores the snapshot at `storage_state_path` when one exists,
    /// otherwise logs in (and writes the snapshot if a path is configured).
    pub async fn setup(config: RequestUtilsConfig) -> Result<Self> {
        let utils = Self::builder(config).build()?;
        utils.establish().await?;
        Ok(utils)
    }

    /// Restores or creates the session, moving to `Ready` or `Failed`.
    pub async fn establish(&self) -> Result<()> {
        *self.phase.write().await = SessionPhase::Authenticating;

        let outcome = self.restore_or_login().await;
        let next = match &outcome {
            Ok(()) => SessionPhase::Ready,
            Err(err) => {
                error!("Could not establish a session: {}", err);
                SessionPhase::Failed
            }
        };
        *self.phase.write().await = next;
        outcome
    }

    async fn restore_or_login(&self) -> Result<()> {
        if let Some(path) = self.config.storage_state_path.clone() {
            let display = path.display().to_string();
            let restored = tokio::task::spawn_blocking(move || load_storage_state(&path))
                .await
                .map_err(|e| {
                    Error::Configuration(format!("Session snapshot reader panicked: {}", e))
                })??;

            if let Some(state) = restored {
                info!("Restored session from {}", display);
                self.client.install_session(state).await;
                return Ok(());
            }
        }

        let state = self.client.login().await?;
        info!(
            "Logged in as '{}', REST root {}",
            self.config.user.username, state.root_url
        );
        Ok(())
    }

    pub fn config(&self) -> &RequestUtilsConfig {
        &self.config
    }

    pub async fn phase(&self) -> SessionPhase {
        *self.phase.read().await
    }

    /// The current session; `None` until `Ready`.
    pub async fn session(&self) -> Option<SessionState> {
        if self.phase().await != SessionPhase::Ready {
            return None;
        }
        self.client.session().await
    }

    async fn ready(&self) -> Result<()> {
        match self.phase().await {
            SessionPhase::Ready => Ok(()),
            phase => Err(Error::SessionNotReady(phase)),
        }
    }

    pub async fn rest(&self, request: RestRequest) -> Result<Value> {
        self.ready().await?;
        self.client.rest(request).await
    }

    pub async fn batch_rest(&self, requests: Vec<BatchRequest>) -> Result<BatchResponse> {
        self.ready().await?;
        self.client.batch_rest(requests).await
    }

    pub async fn max_batch_size(&self) -> Result<usize> {
        self.ready().await?;
        self.client.max_batch_size().await
    }

    pub async fn delete_all_posts(&self) -> Result<usize> {
        self.ready().await?;
        self.fixtures.delete_all_posts().await
    }

    pub async fn delete_all_blocks(&self) -> Result<usize> {
        self.ready().await?;
        self.fixtures.delete_all_blocks().await
    }

    pub async fn delete_all_widgets(&self) -> Result<usize> {
        self.ready().await?;
        self.fixtures.delete_all_widgets().await
    }

    pub async fn create_post(&self, data: Value) -> Result<Value> {
        self.ready().await?;
        self.fixtures.create_post(data).await
    }

    pub async fn create_block(&self, data: Value) -> Result<Value> {
        self.ready().await?;
        self.fixtures.create_block(data).await
    }

    pub async fn activate_plugin(&self, slug: &str) -> Result<bool> {
        self.ready().await?;
        self.fixtures.activate_plugin(slug).await
    }

    pub async fn deactivate_plugin(&self, slug: &str) -> Result<bool> {
        self.ready().await?;
        self.fixtures.deactivate_plugin(slug).await
    }

    pub async fn activate_theme(&self, slug: &str) -> Result<bool> {
        self.ready().await?;
        self.fixtures.activate_theme(slug).await
    }
}
