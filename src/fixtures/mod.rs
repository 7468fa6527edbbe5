//! Idempotent fixture operations.
//!
//! Every operation looks at the current server state first and only issues
//! the writes needed to reach the target state, so calling it on an already
//! clean site is a successful no-op.

pub mod blocks;
pub mod plugins;
pub mod posts;
pub mod themes;
pub mod widgets;

#[cfg(test)]
pub(crate) mod fake;

use crate::executor::error::{Error, Result};
use crate::models::request::{BatchRequest, RestRequest};
use crate::registry::{PluginMap, SnapshotCache, ThemeMap};
use crate::rest::RestApi;
use log::debug;
use serde_json::Value;
use std::collections::HashSet;

/// Page size used when listing resources to delete.
pub const PAGE_SIZE: usize = 100;

/// Every post status, so trashed and scheduled items are cleaned up too.
pub const ALL_POST_STATUSES: &str = "publish,future,draft,pending,private,trash";

/// Cleanup and activation operations over any [`RestApi`].
pub struct Fixtures<R> {
    rest: R,
    plugins: SnapshotCache<PluginMap>,
    themes: SnapshotCache<ThemeMap>,
}

impl<R: RestApi> Fixtures<R> {
    pub fn new(rest: R) -> Self {
        Self {
            rest,
            plugins: SnapshotCache::new(),
            themes: SnapshotCache::new(),
        }
    }

    pub fn rest(&self) -> &R {
        &self.rest
    }

    /// Deletes every item of a post-like collection, page by page.
    ///
    /// Returns how many items were deleted. The first failed deletion aborts
    /// with its error, and a listing made up only of items already deleted
    /// is an [`Error::InvalidResponse`].
    async fn delete_collection(&self, route: &str) -> Result<usize> {
        let mut deleted = HashSet::new();

        loop {
            let listing = self
                .rest
                .rest(
                    RestRequest::get(route)
                        .param("per_page", PAGE_SIZE.to_string())
                        .param("status", ALL_POST_STATUSES)
                        .param("_fields", "id"),
                )
                .await?;

            let ids = ids_of(&listing);
            if ids.is_empty() {
                debug!("{}: deleted {} items", route, deleted.len());
                return Ok(deleted.len());
            }
            if ids.iter().all(|id| deleted.contains(id)) {
                return Err(Error::InvalidResponse(format!(
                    "{} still lists {} deleted items",
                    route,
                    ids.len()
                )));
            }

            let requests = ids
                .iter()
                .map(|id| BatchRequest::delete(format!("{}/{}", route, id)))
                .collect();
            let response = self.rest.batch_rest(requests).await?;
            if let Some(err) = response.first_error() {
                return Err(err.clone());
            }
            deleted.extend(ids);
        }
    }
}

/// Collects the `id` of every object in a listing. Numeric and string ids
/// are both rendered as strings.
pub(crate) fn ids_of(listing: &Value) -> Vec<String> {
    listing
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item.get("id") {
                    Some(Value::Number(n)) => Some(n.to_string()),
                    Some(Value::String(s)) => Some(s.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
