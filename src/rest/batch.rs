//! Batch planning and batch response decoding.
//!
//! A batch larger than the server maximum is split into contiguous chunks,
//! each sent as its own round-trip. Chunks are independent: a failed chunk
//! reports an error for each of its own items and leaves every other chunk's
//! items alone.

use crate::executor::error::{Error, Result};
use crate::models::response::BatchItem;
use serde_json::Value;
use std::ops::Range;

/// Batch size assumed when the server does not advertise one.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

/// Splits `len` items into contiguous ranges of at most `max` items.
///
/// Produces exactly `ceil(len / max)` ranges; every range but the last holds
/// `max` items. A `max` of zero is treated as one.
pub fn plan_chunks(len: usize, max: usize) -> Vec<Range<usize>> {
    let max = max.max(1);
    (0..len)
        .step_by(max)
        .map(|start| start..(start + max).min(len))
        .collect()
}

/// Reads `endpoints[0].args.requests.maxItems` from the batch endpoint's
/// OPTIONS response.
pub fn max_items_from_options(options: &Value) -> usize {
    options
        .pointer("/endpoints/0/args/requests/maxItems")
        .and_then(|v| v.as_u64())
        .and_then(|v| usize::try_from(v).ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_MAX_BATCH_SIZE)
}

/// Decodes the body of one successful batch round-trip into per-item
/// results.
///
/// A `failed: "validation"` response marks items that were valid but not
/// executed as `null`; those become `batch_not_executed` errors.
pub fn decode_chunk(body: &Value, expected: usize) -> Result<Vec<Result<BatchItem>>> {
    let responses = body
        .get("responses")
        .and_then(|r| r.as_array())
        .ok_or_else(|| {
            Error::InvalidResponse(format!("batch response without responses: {}", body))
        })?;

    if responses.len() != expected {
        return Err(Error::InvalidResponse(format!(
            "batch returned {} responses for {} requests",
            responses.len(),
            expected
        )));
    }

    let failed_validation = body.get("failed").and_then(|f| f.as_str()) == Some("validation");

    Ok(responses
        .iter()
        .map(|item| {
            if item.is_null() {
                return Err(Error::Server {
                    status: 424,
                    code: "batch_not_executed".to_string(),
                    message: if failed_validation {
                        "not executed: another request in the batch failed validation"
                            .to_string()
                    } else {
                        "not executed".to_string()
                    },
                });
            }
            BatchItem::from_value(item)
        })
        .collect())
}

/// Classifies a rejected batch round-trip.
///
/// The batch endpoint rejects oversized batches as an invalid `requests`
/// parameter; that case is reported as a capability mismatch.
pub fn chunk_rejection(status: u16, body: &Value, max: usize, attempted: usize) -> Error {
    let invalid_requests_param = body.get("code").and_then(|c| c.as_str())
        == Some("rest_invalid_param")
        && body.pointer("/data/params/requests").is_some();

    if status == 400 && invalid_requests_param {
        Error::CapabilityMismatch { max, attempted }
    } else {
        Error::from_envelope(status, body)
    }
}
