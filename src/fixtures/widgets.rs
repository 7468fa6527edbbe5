//! Widgets and sidebars.

use super::{ids_of, Fixtures};
use crate::executor::error::Result;
use crate::models::request::{BatchRequest, HttpMethod, RestRequest};
use crate::rest::RestApi;
use serde_json::{json, Value};

impl<R: RestApi> Fixtures<R> {
    /// Deletes every widget, then empties any sidebar still listing one.
    ///
    /// Returns the number of deleted widgets.
    pub async fn delete_all_widgets(&self) -> Result<usize> {
        let widgets = self.rest.rest(RestRequest::get("/wp/v2/widgets")).await?;
        let ids = ids_of(&widgets);

        if !ids.is_empty() {
            let requests = ids
                .iter()
                .map(|id| BatchRequest::delete(format!("/wp/v2/widgets/{}", id)))
                .collect();
            let response = self.rest.batch_rest(requests).await?;
            if let Some(err) = response.first_error() {
                return Err(err.clone());
            }
        }

        let sidebars = self.rest.rest(RestRequest::get("/wp/v2/sidebars")).await?;
        let updates: Vec<BatchRequest> = sidebars
            .as_array()
            .map(|items| items.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(|sidebar| has_widgets(sidebar))
            .filter_map(|sidebar| sidebar.get("id").and_then(|id| id.as_str()))
            .map(|id| {
                BatchRequest::new(HttpMethod::POST, format!("/wp/v2/sidebars/{}", id))
                    .with_body(json!({ "id": id, "widgets": [] }))
            })
            .collect();

        if !updates.is_empty() {
            let response = self.rest.batch_rest(updates).await?;
            if let Some(err) = response.first_error() {
                return Err(err.clone());
            }
        }

        Ok(ids.len())
    }
}

fn has_widgets(sidebar: &Value) -> bool {
    sidebar
        .get("widgets")
        .and_then(|w| w.as_array())
        .is_some_and(|w| !w.is_empty())
}
