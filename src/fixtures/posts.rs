//! Posts.

use super::Fixtures;
use crate::executor::error::Result;
use crate::models::request::{HttpMethod, RestRequest};
use crate::rest::RestApi;
use serde_json::Value;

const POSTS_ROUTE: &str = "/wp/v2/posts";

impl<R: RestApi> Fixtures<R> {
    /// Deletes every post regardless of status, bypassing the trash.
    ///
    /// Returns the number of deleted posts; zero on an empty site.
    pub async fn delete_all_posts(&self) -> Result<usize> {
        self.delete_collection(POSTS_ROUTE).await
    }

    /// Creates a post and returns it as the server rendered it.
    pub async fn create_post(&self, data: Value) -> Result<Value> {
        self.rest
            .rest(RestRequest::new(HttpMethod::POST, POSTS_ROUTE).data(data))
            .await
    }
}
