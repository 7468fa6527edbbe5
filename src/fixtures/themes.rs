//! Theme activation.
//!
//! The REST API can list themes but not switch them, so activation follows
//! the nonce-protected link on `wp-admin/themes.php`.

use super::Fixtures;
use crate::executor::error::{Error, Result};
use crate::models::request::RestRequest;
use crate::registry::{themes_from_listing, Snapshot, ThemeEntry, ThemeMap};
use crate::rest::RestApi;
use log::{debug, info};
use regex::Regex;

impl<R: RestApi> Fixtures<R> {
    /// The cached stylesheet → theme map, fetched on first use.
    pub async fn themes_map(&self) -> Result<Snapshot<ThemeMap>> {
        self.themes.get_or_fetch(|| self.fetch_themes()).await
    }

    /// Activates a theme by stylesheet. Returns false if it already was the
    /// active theme.
    pub async fn activate_theme(&self, slug: &str) -> Result<bool> {
        let theme = self.theme_entry(slug).await?;
        if theme.active {
            return Ok(false);
        }

        let page = self.rest.admin_page("themes.php").await?;
        let Some(link) = activation_link(&page, &theme.stylesheet) else {
            // No link means the theme is already active server side and the
            // snapshot is stale.
            self.themes.invalidate().await;
            let theme = self.theme_entry(slug).await?;
            if theme.active {
                return Ok(false);
            }
            return Err(Error::InvalidResponse(format!(
                "no activation link for theme \"{}\" on themes.php",
                slug
            )));
        };

        debug!("Activating theme '{}' via {}", slug, link);
        self.rest.admin_page(&link).await?;
        self.themes.invalidate().await;
        info!("Theme '{}' is now active", slug);
        Ok(true)
    }

    async fn fetch_themes(&self) -> Result<ThemeMap> {
        let listing = self
            .rest
            .rest(RestRequest::get("/wp/v2/themes").param("_fields", "stylesheet,status"))
            .await?;
        themes_from_listing(&listing)
    }

    /// Looks a theme up, refreshing the registry once if it is unknown.
    async fn theme_entry(&self, slug: &str) -> Result<ThemeEntry> {
        let ticket = self.themes.refresh_ticket();
        let snapshot = self.themes_map().await?;
        if let Some(theme) = snapshot.value.get(slug) {
            return Ok(theme.clone());
        }

        let snapshot = self
            .themes
            .refresh(ticket, || self.fetch_themes())
            .await?;
        snapshot
            .value
            .get(slug)
            .cloned()
            .ok_or_else(|| Error::ThemeNotFound(slug.to_string()))
    }
}

/// Extracts the `themes.php?action=activate...` link for a stylesheet from
/// the themes admin page, with HTML entities decoded.
pub fn activation_link(html: &str, stylesheet: &str) -> Option<String> {
    let encoded: String = url::form_urlencoded::byte_serialize(stylesheet.as_bytes()).collect();
    let pattern = format!(
        r"action=activate&(?:amp;)?stylesheet={}&(?:amp;)?_wpnonce=[a-z0-9]+",
        regex::escape(&encoded)
    );
    let re = Regex::new(&pattern).ok()?;
    re.find(html)
        .map(|m| format!("themes.php?{}", m.as_str().replace("&amp;", "&")))
}
