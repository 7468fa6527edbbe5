//! Reusable blocks (`wp_block` posts).

use super::Fixtures;
use crate::executor::error::Result;
use crate::models::request::{HttpMethod, RestRequest};
use crate::rest::RestApi;
use serde_json::Value;

const BLOCKS_ROUTE: &str = "/wp/v2/blocks";

impl<R: RestApi> Fixtures<R> {
    /// Deletes every reusable block regardless of status.
    pub async fn delete_all_blocks(&self) -> Result<usize> {
        self.delete_collection(BLOCKS_ROUTE).await
    }

    /// Creates a reusable block.
    pub async fn create_block(&self, data: Value) -> Result<Value> {
        self.rest
            .rest(RestRequest::new(HttpMethod::POST, BLOCKS_ROUTE).data(data))
            .await
    }
}
