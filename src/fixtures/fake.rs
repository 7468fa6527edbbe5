//! In-memory WordPress used by the fixture tests.

use crate::executor::error::{Error, Result};
use crate::models::request::{BatchRequest, HttpMethod, RestRequest};
use crate::models::response::{BatchItem, BatchResponse, ChunkStatus};
use crate::rest::{plan_chunks, RestApi};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct State {
    next_id: u64,
    posts: BTreeMap<u64, Value>,
    blocks: BTreeMap<u64, Value>,
    widgets: BTreeMap<String, String>,
    sidebars: BTreeMap<String, Vec<String>>,
    plugins: Vec<(String, String, String)>,
    themes: Vec<(String, bool)>,
    failing: HashSet<String>,
    keep_deleted_posts: bool,
    batch_round_trips: usize,
    plugin_listings: usize,
    plugin_writes: usize,
    theme_listings: usize,
    admin_page_hits: usize,
}

pub(crate) struct FakeSite {
    max_batch: usize,
    listing_delay: Duration,
    state: Mutex<State>,
}

fn not_found(path: &str) -> Error {
    Error::Server {
        status: 404,
        code: "rest_no_route".to_string(),
        message: format!("No route was found matching {}", path),
    }
}

impl FakeSite {
    pub fn with_max_batch(max_batch: usize) -> Self {
        Self {
            max_batch,
            listing_delay: Duration::ZERO,
            state: Mutex::new(State::default()),
        }
    }

    /// Every GET waits this long before answering.
    pub fn with_listing_delay(mut self, delay: Duration) -> Self {
        self.listing_delay = delay;
        self
    }

    pub fn seed_posts(&self, count: usize) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..count {
            state.next_id += 1;
            let id = state.next_id;
            state.posts.insert(id, json!({ "id": id }));
        }
    }

    pub fn seed_widget(&self, id: &str, sidebar: &str) {
        let mut state = self.state.lock().unwrap();
        state.widgets.insert(id.to_string(), sidebar.to_string());
        state
            .sidebars
            .entry(sidebar.to_string())
            .or_default()
            .push(id.to_string());
    }

    /// A sidebar entry pointing at a widget the widgets endpoint doesn't list.
    pub fn seed_orphan_sidebar_entry(&self, sidebar: &str, widget: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .sidebars
            .entry(sidebar.to_string())
            .or_default()
            .push(widget.to_string());
    }

    pub fn seed_plugin(&self, file: &str, name: &str, status: &str) {
        self.state.lock().unwrap().plugins.push((
            file.to_string(),
            name.to_string(),
            status.to_string(),
        ));
    }

    pub fn seed_theme(&self, stylesheet: &str, active: bool) {
        self.state
            .lock()
            .unwrap()
            .themes
            .push((stylesheet.to_string(), active));
    }

    pub fn fail_deletes_of(&self, path: &str) {
        self.state.lock().unwrap().failing.insert(path.to_string());
    }

    /// Post deletions report success but leave the post in place.
    pub fn keep_deleted_posts(&self) {
        self.state.lock().unwrap().keep_deleted_posts = true;
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }

    pub fn block_count(&self) -> usize {
        self.state.lock().unwrap().blocks.len()
    }

    pub fn widget_count(&self) -> usize {
        self.state.lock().unwrap().widgets.len()
    }

    pub fn sidebars_are_empty(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .sidebars
            .values()
            .all(|widgets| widgets.is_empty())
    }

    pub fn plugin_status(&self, file: &str) -> String {
        let state = self.state.lock().unwrap();
        state
            .plugins
            .iter()
            .find(|(f, _, _)| f == file)
            .map(|(_, _, status)| status.clone())
            .unwrap()
    }

    pub fn active_theme(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .themes
            .iter()
            .find(|(_, active)| *active)
            .map(|(stylesheet, _)| stylesheet.clone())
    }

    pub fn batch_round_trips(&self) -> usize {
        self.state.lock().unwrap().batch_round_trips
    }

    pub fn plugin_listings(&self) -> usize {
        self.state.lock().unwrap().plugin_listings
    }

    pub fn plugin_writes(&self) -> usize {
        self.state.lock().unwrap().plugin_writes
    }

    pub fn theme_listings(&self) -> usize {
        self.state.lock().unwrap().theme_listings
    }

    pub fn admin_page_hits(&self) -> usize {
        self.state.lock().unwrap().admin_page_hits
    }

    fn apply(state: &mut State, request: &BatchRequest) -> Result<BatchItem> {
        let path = request.path.split('?').next().unwrap_or_default();
        if state.failing.contains(path) {
            return Err(Error::Server {
                status: 500,
                code: "rest_cannot_delete".to_string(),
                message: "The post cannot be deleted.".to_string(),
            });
        }

        let removed = match (request.method, path.rsplit_once('/')) {
            (HttpMethod::DELETE, Some(("/wp/v2/posts", id))) => match id.parse::<u64>() {
                Ok(id) if state.keep_deleted_posts => state.posts.contains_key(&id),
                Ok(id) => state.posts.remove(&id).is_some(),
                Err(_) => false,
            },
            (HttpMethod::DELETE, Some(("/wp/v2/blocks", id))) => id
                .parse()
                .ok()
                .and_then(|id: u64| state.blocks.remove(&id))
                .is_some(),
            (HttpMethod::DELETE, Some(("/wp/v2/widgets", id))) => {
                match state.widgets.remove(id) {
                    Some(sidebar) => {
                        if let Some(widgets) = state.sidebars.get_mut(&sidebar) {
                            widgets.retain(|w| w != id);
                        }
                        true
                    }
                    None => false,
                }
            }
            (HttpMethod::POST, Some(("/wp/v2/sidebars", id))) => {
                let emptied = request
                    .body
                    .as_ref()
                    .and_then(|b| b.get("widgets"))
                    .and_then(|w| w.as_array())
                    .is_some_and(|w| w.is_empty());
                if emptied {
                    if let Some(widgets) = state.sidebars.get_mut(id) {
                        widgets.clear();
                    }
                }
                true
            }
            _ => false,
        };

        if !removed {
            return Err(not_found(path));
        }
        Ok(BatchItem {
            status: 200,
            body: json!({ "deleted": true }),
        })
    }
}

#[async_trait]
impl RestApi for FakeSite {
    async fn rest(&self, request: RestRequest) -> Result<Value> {
        if request.method == HttpMethod::GET && !self.listing_delay.is_zero() {
            tokio::time::sleep(self.listing_delay).await;
        }
        let mut state = self.state.lock().unwrap();
        let per_page = request
            .params
            .iter()
            .find(|(k, _)| k == "per_page")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(10);

        match (request.method, request.path.as_str()) {
            (HttpMethod::GET, "/wp/v2/posts") => Ok(Value::Array(
                state.posts.values().take(per_page).cloned().collect(),
            )),
            (HttpMethod::GET, "/wp/v2/blocks") => Ok(Value::Array(
                state.blocks.values().take(per_page).cloned().collect(),
            )),
            (HttpMethod::POST, route @ ("/wp/v2/posts" | "/wp/v2/blocks")) => {
                state.next_id += 1;
                let id = state.next_id;
                let mut item = request.data.unwrap_or_else(|| json!({}));
                item["id"] = json!(id);
                let collection = if route == "/wp/v2/posts" {
                    &mut state.posts
                } else {
                    &mut state.blocks
                };
                collection.insert(id, item.clone());
                Ok(item)
            }
            (HttpMethod::GET, "/wp/v2/widgets") => Ok(state
                .widgets
                .iter()
                .map(|(id, sidebar)| json!({ "id": id, "sidebar": sidebar }))
                .collect()),
            (HttpMethod::GET, "/wp/v2/sidebars") => Ok(state
                .sidebars
                .iter()
                .map(|(id, widgets)| json!({ "id": id, "widgets": widgets }))
                .collect()),
            (HttpMethod::GET, "/wp/v2/plugins") => {
                state.plugin_listings += 1;
                Ok(state
                    .plugins
                    .iter()
                    .map(|(file, name, status)| {
                        json!({ "plugin": file, "name": name, "status": status })
                    })
                    .collect())
            }
            (method, path) if path.starts_with("/wp/v2/plugins/") => {
                let file = &path["/wp/v2/plugins/".len()..];
                let new_status = request
                    .data
                    .as_ref()
                    .and_then(|d| d.get("status"))
                    .and_then(|s| s.as_str())
                    .map(str::to_string);
                if method == HttpMethod::PUT {
                    state.plugin_writes += 1;
                }
                let plugin = state
                    .plugins
                    .iter_mut()
                    .find(|(f, _, _)| f == file)
                    .ok_or_else(|| not_found(path))?;
                if let (HttpMethod::PUT, Some(status)) = (method, new_status) {
                    plugin.2 = status;
                }
                Ok(json!({ "plugin": plugin.0, "status": plugin.2 }))
            }
            (HttpMethod::GET, "/wp/v2/themes") => {
                state.theme_listings += 1;
                Ok(state
                    .themes
                    .iter()
                    .map(|(stylesheet, active)| {
                        json!({
                            "stylesheet": stylesheet,
                            "status": if *active { "active" } else { "inactive" }
                        })
                    })
                    .collect())
            }
            (_, path) => Err(not_found(path)),
        }
    }

    async fn batch_rest(&self, requests: Vec<BatchRequest>) -> Result<BatchResponse> {
        let mut state = self.state.lock().unwrap();
        let mut response = BatchResponse::default();

        for range in plan_chunks(requests.len(), self.max_batch) {
            state.batch_round_trips += 1;
            for request in &requests[range.clone()] {
                let item = Self::apply(&mut state, request);
                response.items.push(item);
            }
            response.chunks.push(ChunkStatus {
                offset: range.start,
                len: range.len(),
                outcome: Ok(()),
            });
        }
        Ok(response)
    }

    async fn max_batch_size(&self) -> Result<usize> {
        Ok(self.max_batch)
    }

    async fn admin_page(&self, path: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.admin_page_hits += 1;

        if path == "themes.php" {
            return Ok(state
                .themes
                .iter()
                .filter(|(_, active)| !active)
                .map(|(stylesheet, _)| {
                    format!(
                        "<a href=\"themes.php?action=activate&amp;stylesheet={0}&amp;_wpnonce=abc123\">Activate {0}</a>\n",
                        stylesheet
                    )
                })
                .collect());
        }

        let stylesheet = path
            .strip_prefix("themes.php?action=activate&stylesheet=")
            .and_then(|rest| rest.split('&').next())
            .ok_or_else(|| not_found(path))?
            .to_string();
        for (name, active) in state.themes.iter_mut() {
            *active = *name == stylesheet;
        }
        Ok(String::new())
    }
}
