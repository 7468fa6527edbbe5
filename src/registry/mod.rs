//! Plugin and theme registry snapshots.
//!
//! The REST API addresses plugins by their main file (`akismet/akismet`) and
//! themes by stylesheet, while tests refer to them by a human slug. The
//! snapshots built here map one to the other and live in a
//! [`SnapshotCache`] owned by the orchestrator.

pub mod cache;

pub use cache::{Snapshot, SnapshotCache};

use crate::executor::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Plugin slug → plugin file identifier.
pub type PluginMap = HashMap<String, String>;

/// Theme stylesheet → theme entry.
pub type ThemeMap = HashMap<String, ThemeEntry>;

/// One installed theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEntry {
    pub stylesheet: String,
    pub active: bool,
}

/// Lowercase, dash-separated slug of a display name.
///
/// Words are split on anything that is not a letter or digit and on
/// letter/digit boundaries: `"Gutenberg Test Plugin, Disable Formats"`
/// becomes `"gutenberg-test-plugin-disable-formats"`.
pub fn kebab_case(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut last_was_digit: Option<bool> = None;

    for ch in name.to_lowercase().chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            last_was_digit = None;
            continue;
        }
        let is_digit = ch.is_ascii_digit();
        if last_was_digit.is_some_and(|d| d != is_digit) && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        last_was_digit = Some(is_digit);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.join("-")
}

/// Builds the plugin map from a `/wp/v2/plugins` listing.
pub fn plugins_from_listing(listing: &Value) -> Result<PluginMap> {
    let plugins = listing.as_array().ok_or_else(|| {
        Error::InvalidResponse(format!("expected a plugin list, got {}", listing))
    })?;

    let mut map = PluginMap::new();
    for plugin in plugins {
        let (Some(name), Some(file)) = (
            plugin.get("name").and_then(|v| v.as_str()),
            plugin.get("plugin").and_then(|v| v.as_str()),
        ) else {
            continue;
        };
        map.insert(kebab_case(name), file.to_string());
    }
    Ok(map)
}

/// Resolves a slug against the plugin map.
///
/// Falls back to a comparison that ignores dashes and case, so
/// `"GutenbergTestPlugin-DisableFormats"` still finds
/// `"gutenberg-test-plugin-disable-formats"`.
pub fn resolve_plugin<'a>(map: &'a PluginMap, slug: &str) -> Option<&'a str> {
    if let Some(file) = map.get(slug) {
        return Some(file.as_str());
    }
    let wanted = squash(slug);
    map.iter()
        .find(|(key, _)| squash(key) == wanted)
        .map(|(_, file)| file.as_str())
}

fn squash(slug: &str) -> String {
    slug.chars()
        .filter(|c| *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Builds the theme map from a `/wp/v2/themes` listing.
pub fn themes_from_listing(listing: &Value) -> Result<ThemeMap> {
    let themes = listing.as_array().ok_or_else(|| {
        Error::InvalidResponse(format!("expected a theme list, got {}", listing))
    })?;

    let mut map = ThemeMap::new();
    for theme in themes {
        let Some(stylesheet) = theme.get("stylesheet").and_then(|v| v.as_str()) else {
            continue;
        };
        let active = theme.get("status").and_then(|v| v.as_str()) == Some("active");
        map.insert(
            stylesheet.to_string(),
            ThemeEntry {
                stylesheet: stylesheet.to_string(),
                active,
            },
        );
    }
    Ok(map)
}
