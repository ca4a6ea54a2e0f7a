use std::collections::HashMap;

use async_trait::async_trait;
use eyre::Result;
use serde::Deserialize;
use serde_json::Value;

/// Tag applied to a torrent once its category has been set, tagged torrents
/// are never picked up again.
pub const PROCESSED_TAG: &str = "GGn-Sorted";

#[derive(Debug, Clone, Deserialize)]
pub struct Torrent {
    pub hash: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: String,
}

impl Torrent {
    /// The web UI reports tags as a single comma separated string.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.split(',').any(|t| t.trim() == tag)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tracker {
    pub url: String,
}

pub fn filter_unprocessed(torrents: Vec<Torrent>) -> Vec<Torrent> {
    torrents
        .into_iter()
        .filter(|t| !t.has_tag(PROCESSED_TAG))
        .collect()
}

pub fn has_tracker_from(trackers: &[Tracker], domain: &str) -> bool {
    let domain = domain.to_lowercase();
    trackers
        .iter()
        .any(|t| t.url.to_lowercase().contains(&domain))
}

#[async_trait]
pub trait TorrentsHandler {
    async fn login(&mut self) -> Result<()>;
    async fn list_unprocessed(&self) -> Result<Vec<Torrent>>;
    async fn trackers(&self, hash: &str) -> Result<Vec<Tracker>>;
    async fn properties(&self, hash: &str) -> Result<Value>;
    async fn categories(&self) -> Result<HashMap<String, Value>>;
    async fn create_category(&self, category: &str, save_path: &str) -> Result<()>;
    async fn set_category(&self, hash: &str, category: &str) -> Result<()>;
    async fn add_tags(&self, hash: &str, tags: &str) -> Result<()>;
}
