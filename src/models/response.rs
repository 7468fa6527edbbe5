//! Response data models.
//!
//! `HttpResponse` is what the executor hands back for every wire request.
//! `BatchItem` and `BatchResponse` carry the per-call outcome of a batch.

use crate::executor::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// A raw HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Response headers, names lowercased. Repeated headers are joined with
    /// `", "` except `Set-Cookie`, which is kept separately.
    pub headers: HashMap<String, String>,

    /// Every `Set-Cookie` header value, in the order received.
    pub set_cookies: Vec<String>,

    /// Raw body bytes.
    pub body: Vec<u8>,

    /// Time from sending the request until the body was read.
    pub duration: Duration,
}

impl HttpResponse {
    /// Creates an empty response with the given status.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            set_cookies: Vec::new(),
            body: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON. An empty body decodes to `Value::Null`.
    pub fn json(&self) -> Result<Value> {
        if self.body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            Error::InvalidResponse(format!(
                "expected JSON from server (status {}): {}",
                self.status_code, e
            ))
        })
    }
}

/// A successful entry of a batch call.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub status: u16,
    pub body: Value,
}

impl BatchItem {
    /// Converts one element of the batch endpoint's `responses` array.
    ///
    /// Entries with a status of 400 or above become server errors.
    pub fn from_value(value: &Value) -> Result<BatchItem> {
        let status = value
            .get("status")
            .and_then(|s| s.as_u64())
            .and_then(|s| u16::try_from(s).ok())
            .ok_or_else(|| {
                Error::InvalidResponse(format!("batch response item without status: {}", value))
            })?;
        let body = value.get("body").cloned().unwrap_or(Value::Null);

        if status >= 400 {
            return Err(Error::from_envelope(status, &body));
        }
        Ok(BatchItem { status, body })
    }
}

/// Outcome of one sub-batch round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkStatus {
    /// Index of the chunk's first item within the submitted sequence.
    pub offset: usize,
    pub len: usize,
    /// `Err` when the round-trip itself failed; item failures inside a
    /// successful round-trip are reported per item only.
    pub outcome: Result<()>,
}

/// Results of a batch call, in submission order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResponse {
    pub items: Vec<Result<BatchItem>>,
    pub chunks: Vec<ChunkStatus>,
}

impl BatchResponse {
    /// Number of round-trips the call took.
    pub fn round_trips(&self) -> usize {
        self.chunks.len()
    }

    /// True when every item succeeded.
    pub fn is_success(&self) -> bool {
        self.items.iter().all(|item| item.is_ok())
    }

    /// The first failing item, if any.
    pub fn first_error(&self) -> Option<&Error> {
        self.items.iter().find_map(|item| item.as_ref().err())
    }

    /// Bodies of the successful items, in order.
    pub fn successes(&self) -> Vec<&Value> {
        self.items
            .iter()
            .filter_map(|item| item.as_ref().ok())
            .map(|item| &item.body)
            .collect()
    }

    /// Turns the response into a plain list of bodies, failing on the first
    /// error.
    pub fn into_bodies(self) -> Result<Vec<Value>> {
        self.items
            .into_iter()
            .map(|item| item.map(|i| i.body))
            .collect()
    }
}
