use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use eyre::{eyre, ContextCompat, Result, WrapErr};
use reqwest::{
    header::{COOKIE, SET_COOKIE},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::torrents::{filter_unprocessed, Torrent, TorrentsHandler, Tracker};
use crate::Settings;

pub const SID_KEY: &str = "SID";
const LOGIN_OK: &str = "Ok.";

pub struct QTorrentHandler {
    config: Arc<Settings>,
    http_client: Client,
    // session cookie, present only after a successful login
    sid: Option<String>,
}

impl QTorrentHandler {
    pub fn new(config: Arc<Settings>, http_client: Client) -> Self {
        Self { config, http_client, sid: None }
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/v2/{}",
            self.config.torrent_web_ui.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    fn sid_cookie(&self) -> Result<String> {
        let sid = self.sid.as_ref().wrap_err("not logged in to torrent web UI")?;
        Ok(format!("{}={}", SID_KEY, sid))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        let cookie = self.sid_cookie()?;
        let resp = self
            .http_client
            .get(self.api_url(endpoint))
            .header(COOKIE, cookie)
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(eyre!("{} returned HTTP {}", endpoint, status));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body)
            .wrap_err_with(|| format!("could not deserialize json: {:?}", &body))
    }

    async fn post_form(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<StatusCode> {
        let cookie = self.sid_cookie()?;
        let resp = self
            .http_client
            .post(self.api_url(endpoint))
            .header(COOKIE, cookie)
            .form(params)
            .send()
            .await?;

        Ok(resp.status())
    }
}

#[async_trait]
impl TorrentsHandler for QTorrentHandler {
    async fn login(&mut self) -> Result<()> {
        let url = self.api_url("auth/login");

        let params = [
            ("username", self.config.torrent_web_ui.username.as_str()),
            ("password", self.config.torrent_web_ui.password.as_str()),
        ];

        let resp = self.http_client.post(url).form(&params).send().await?;

        let status = resp.status();
        let cookies = match resp.headers().get(SET_COOKIE) {
            Some(c) => Some(c.to_str()?.to_string()),
            None => None,
        };
        let body = resp.text().await?;

        if !status.is_success() || body != LOGIN_OK {
            return Err(eyre!("login failed: {} - {}", status, body));
        }

        let cookies_str =
            cookies.wrap_err("could not generate SID, no cookies found in response headers")?;
        if !cookies_str.contains(SID_KEY) {
            return Err(eyre!("no SID cookie found in response while logging in"));
        }

        let idx = match cookies_str.find(';') {
            Some(i) => i,
            None => cookies_str.len(),
        };

        self.sid = Some(cookies_str[4..idx].to_string());
        info!("logged in to torrent web UI");

        Ok(())
    }

    async fn list_unprocessed(&self) -> Result<Vec<Torrent>> {
        let all: Vec<Torrent> = self.get_json("torrents/info", &[]).await?;
        let total = all.len();

        let remaining = filter_unprocessed(all);
        info!("retrieved {} unprocessed torrents (out of {} total)", remaining.len(), total);

        Ok(remaining)
    }

    async fn trackers(&self, hash: &str) -> Result<Vec<Tracker>> {
        self.get_json("torrents/trackers", &[("hash", hash)]).await
    }

    async fn properties(&self, hash: &str) -> Result<Value> {
        self.get_json("torrents/properties", &[("hash", hash)]).await
    }

    async fn categories(&self) -> Result<HashMap<String, Value>> {
        self.get_json("torrents/categories", &[]).await
    }

    async fn create_category(&self, category: &str, save_path: &str) -> Result<()> {
        let params = [("category", category), ("savePath", save_path)];
        let status = self.post_form("torrents/createCategory", &params).await?;

        if !status.is_success() {
            return Err(eyre!("could not create category {:?}: HTTP {}", category, status));
        }

        info!("created category {:?}", category);
        Ok(())
    }

    async fn set_category(&self, hash: &str, category: &str) -> Result<()> {
        let params = [("hashes", hash), ("category", category)];
        let mut status = self.post_form("torrents/setCategory", &params).await?;

        // 409 means the category does not exist yet, create it and retry the
        // assignment exactly once
        if status == StatusCode::CONFLICT {
            info!("category {:?} does not exist, creating it", category);
            self.create_category(category, "").await?;
            status = self.post_form("torrents/setCategory", &params).await?;
        }

        if !status.is_success() {
            return Err(eyre!(
                "could not set category {:?} on {}: HTTP {}",
                category,
                hash,
                status
            ));
        }

        Ok(())
    }

    async fn add_tags(&self, hash: &str, tags: &str) -> Result<()> {
        let params = [("hashes", hash), ("tags", tags)];
        let status = self.post_form("torrents/addTags", &params).await?;

        if !status.is_success() {
            return Err(eyre!("could not add tags {:?} to {}: HTTP {}", tags, hash, status));
        }

        Ok(())
    }
}
