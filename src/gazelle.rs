use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use reqwest::{header::USER_AGENT, Client};
use serde::Deserialize;
use tracing::info;

use crate::catalog::{CatalogHandler, GameMetadata};
use crate::Settings;

/// Domain a torrent's trackers must point at for it to be picked up.
pub const TRACKER_DOMAIN: &str = "gazellegames.net";

pub const API_KEY_HEADER: &str = "X-API-Key";
const AGENT: &str = "sortqtorrent v0.1";

// unconditional pause before every catalog call, the API throttles hard
const REQUEST_DELAY: Duration = Duration::from_secs(2);

pub struct GazelleHandler {
    config: Arc<Settings>,
    http_client: Client,
}

impl GazelleHandler {
    pub fn new(config: Arc<Settings>, http_client: Client) -> Self {
        Self { config, http_client }
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    status: String,
    #[serde(default)]
    response: Option<GameMetadata>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl CatalogHandler for GazelleHandler {
    async fn torrent_by_hash(&self, hash: &str) -> Result<GameMetadata> {
        tokio::time::sleep(REQUEST_DELAY).await;

        // the API only accepts uppercase hashes
        let hash = hash.to_uppercase();
        info!("querying catalog for torrent hash {}", &hash);

        let resp = self
            .http_client
            .get(&self.config.catalog.base_url)
            .query(&[("request", "torrent"), ("hash", hash.as_str())])
            .header(API_KEY_HEADER, self.config.catalog.api_key.as_str())
            .header(USER_AGENT, AGENT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(eyre!("catalog returned HTTP {} for hash {}", status, &hash));
        }

        let body = resp.text().await?;
        let envelope: ApiEnvelope = serde_json::from_str(&body)
            .wrap_err_with(|| format!("could not deserialize catalog response: {:?}", &body))?;

        if envelope.status != "success" {
            let reason = envelope.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(eyre!("catalog rejected hash {}: {}", &hash, reason));
        }

        Ok(envelope.response.unwrap_or_default())
    }
}
