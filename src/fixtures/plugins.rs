//! Plugin activation.

use super::Fixtures;
use crate::executor::error::{Error, Result};
use crate::models::request::{HttpMethod, RestRequest};
use crate::registry::{plugins_from_listing, resolve_plugin, PluginMap, Snapshot};
use crate::rest::RestApi;
use log::{debug, info};
use serde_json::json;

impl<R: RestApi> Fixtures<R> {
    /// The cached slug → plugin file map, fetched on first use.
    pub async fn plugins_map(&self) -> Result<Snapshot<PluginMap>> {
        self.plugins.get_or_fetch(|| self.fetch_plugins()).await
    }

    /// Activates a plugin by slug. Returns false if it already was active.
    pub async fn activate_plugin(&self, slug: &str) -> Result<bool> {
        self.set_plugin_status(slug, "active").await
    }

    /// Deactivates a plugin by slug. Returns false if it already was inactive.
    pub async fn deactivate_plugin(&self, slug: &str) -> Result<bool> {
        self.set_plugin_status(slug, "inactive").await
    }

    async fn fetch_plugins(&self) -> Result<PluginMap> {
        let listing = self.rest.rest(RestRequest::get("/wp/v2/plugins")).await?;
        let map = plugins_from_listing(&listing)?;
        debug!("Plugin registry holds {} plugins", map.len());
        Ok(map)
    }

    /// Resolves a slug, refreshing the registry once if it is unknown.
    async fn plugin_file(&self, slug: &str) -> Result<String> {
        let ticket = self.plugins.refresh_ticket();
        let snapshot = self.plugins_map().await?;
        if let Some(file) = resolve_plugin(&snapshot.value, slug) {
            return Ok(file.to_string());
        }

        debug!("Plugin '{}' not in registry, refreshing", slug);
        let snapshot = self
            .plugins
            .refresh(ticket, || self.fetch_plugins())
            .await?;
        resolve_plugin(&snapshot.value, slug)
            .map(|file| file.to_string())
            .ok_or_else(|| Error::PluginNotFound(slug.to_string()))
    }

    async fn set_plugin_status(&self, slug: &str, status: &str) -> Result<bool> {
        let file = self.plugin_file(slug).await?;
        let path = format!("/wp/v2/plugins/{}", file);

        let current = self.rest.rest(RestRequest::get(&path)).await?;
        let current_status = current
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or_default();
        let already = match status {
            "active" => current_status == "active" || current_status == "network-active",
            other => current_status == other,
        };
        if already {
            return Ok(false);
        }

        self.rest
            .rest(RestRequest::new(HttpMethod::PUT, &path).data(json!({ "status": status })))
            .await?;
        info!("Plugin '{}' is now {}", file, status);
        Ok(true)
    }
}
