//! Data models for wire requests, REST calls, and batch results.

pub mod request;
pub mod response;

pub use request::{batch_envelope, BatchRequest, HttpMethod, HttpRequest, RequestBody, RestRequest};
pub use response::{BatchItem, BatchResponse, ChunkStatus, HttpResponse};
