//! WordPress Request Utilities
//!
//! Drives a WordPress site over HTTP for end-to-end test setup and teardown:
//! logs in (or restores a saved session), calls the REST API with the
//! session's cookies and nonce, batches calls up to the server's limit, and
//! resets fixtures such as posts, widgets, reusable blocks, plugins, and
//! themes.
//!
//! # Architecture
//!
//! - **config**: settings schema, JSON and environment loading
//! - **executor**: raw HTTP execution using reqwest, and the crate's error type
//! - **models**: request and response data structures
//! - **session**: session state, cookies, and snapshot persistence
//! - **auth**: the login capability and its wp-login.php implementation
//! - **rest**: the REST capability, nonce retry, and batch chunking
//! - **registry**: plugin and theme snapshots with a single-flight cache
//! - **fixtures**: idempotent cleanup and activation operations
//! - **orchestrator**: [`RequestUtils`], which ties the above together
//!
//! # Usage
//!
//! ```no_run
//! use wp_request_utils::{RequestUtils, RequestUtilsConfig};
//!
//! # async fn run() -> wp_request_utils::Result<()> {
//! let config = RequestUtilsConfig {
//!     storage_state_path: Some("artifacts/storage-states/admin.json".into()),
//!     ..Default::default()
//! };
//! let utils = RequestUtils::setup(config).await?;
//!
//! utils.delete_all_posts().await?;
//! utils.activate_plugin("gutenberg-test-plugin-disable-formats").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod executor;
pub mod fixtures;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod rest;
pub mod session;

pub use auth::{Authenticator, User, WpLogin};
pub use config::RequestUtilsConfig;
pub use executor::{Error, Result};
pub use models::{BatchRequest, BatchResponse, HttpMethod, RestRequest};
pub use orchestrator::{RequestUtils, RequestUtilsBuilder};
pub use rest::{RestApi, RestClient};
pub use session::{SessionPhase, SessionState};
