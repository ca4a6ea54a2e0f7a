use std::{env, fs::OpenOptions, path::Path, sync::Arc, time::Duration};

use config::{Config, Environment, File};
use eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::gazelle::GazelleHandler;
use crate::qtorrent::QTorrentHandler;
use crate::sync::sync_categories;
use crate::torrents::TorrentsHandler;

pub mod catalog;
pub mod category;
pub mod gazelle;
pub mod qtorrent;
pub mod sync;
pub mod torrents;

#[derive(Debug, Deserialize)]
pub struct TorrentWebUI {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Catalog {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub torrent_web_ui: TorrentWebUI,
    pub catalog: Catalog,
}

const QTORRENT_TIMEOUT: Duration = Duration::from_secs(10);
const CATALOG_TIMEOUT: Duration = Duration::from_secs(15);

pub async fn run(cfg: Arc<Settings>) -> Result<()> {
    let qtorrent_client = Client::builder().timeout(QTORRENT_TIMEOUT).build()?;
    let catalog_client = Client::builder().timeout(CATALOG_TIMEOUT).build()?;

    let mut torrents_handler = QTorrentHandler::new(cfg.clone(), qtorrent_client);
    let catalog_handler = GazelleHandler::new(cfg, catalog_client);

    torrents_handler.login().await?;

    match torrents_handler.categories().await {
        Ok(categories) => info!("found {} existing categories", categories.len()),
        Err(e) => warn!("could not list existing categories: {:?}", e),
    }

    let updated = sync_categories(&torrents_handler, &catalog_handler).await?;
    info!("successfully updated {} torrent categories", updated);

    Ok(())
}

pub fn init_logging(log_dir: &str, log_file: &str) -> Result<()> {
    let file_appender = OpenOptions::new()
        .create(true)
        .write(true)
        .append(true)
        .open(Path::new(log_dir).join(log_file))?;
    tracing_subscriber::fmt().with_writer(file_appender).init();
    Ok(())
}

pub fn init_config(filename: &str, env_prefix: &str) -> Result<Settings> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name(filename))
        .add_source(File::with_name(&format!("{}_{}", filename, run_mode)).required(false))
        .add_source(Environment::with_prefix(env_prefix).separator("__"))
        .build()?
        .try_deserialize()
        .wrap_err_with(|| format!("failed to create Settings from config provided: {}", filename))
}

pub fn log_and_fail(e: eyre::Report, exit_code: i32) -> ! {
    error!("{:?}", e);
    std::process::exit(exit_code);
}
