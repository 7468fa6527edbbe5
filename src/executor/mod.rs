//! HTTP request execution.
//!
//! Everything that touches the network goes through [`HttpClient`]; the
//! session, REST, and login layers only build [`HttpRequest`]s and interpret
//! [`HttpResponse`]s.
//!
//! [`HttpRequest`]: crate::models::HttpRequest
//! [`HttpResponse`]: crate::models::HttpResponse

pub mod config;
pub mod error;
pub mod native;

pub use config::ExecutionConfig;
pub use error::{Error, Result};
pub use native::HttpClient;
