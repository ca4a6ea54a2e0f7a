use std::time::Duration;

use eyre::Result;
use tracing::{error, info, warn};

use crate::catalog::CatalogHandler;
use crate::category::derive_category;
use crate::gazelle::TRACKER_DOMAIN;
use crate::torrents::{has_tracker_from, TorrentsHandler, PROCESSED_TAG};

// pause between torrents before hitting the catalog again
const CATALOG_PAUSE: Duration = Duration::from_secs(1);

/// Walks every unprocessed torrent once, strictly one at a time: check the
/// trackers, fetch catalog metadata, derive the category, apply it and tag
/// the torrent as processed. A failing torrent is logged and skipped, it
/// never aborts the batch. Returns the number of torrents updated.
pub async fn sync_categories<T, C>(torrents_handler: &T, catalog: &C) -> Result<u64>
where
    T: TorrentsHandler + Sync,
    C: CatalogHandler + Sync,
{
    let torrents = torrents_handler.list_unprocessed().await?;

    let mut updated = 0u64;
    for torrent in &torrents {
        let trackers = match torrents_handler.trackers(&torrent.hash).await {
            Ok(trackers) => trackers,
            Err(e) => {
                warn!("could not fetch trackers for {}: {:?}", &torrent.name, e);
                continue;
            }
        };

        if !has_tracker_from(&trackers, TRACKER_DOMAIN) {
            continue;
        }

        info!("processing torrent: {}", &torrent.name);

        tokio::time::sleep(CATALOG_PAUSE).await;
        let metadata = match catalog.torrent_by_hash(&torrent.hash).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("could not fetch metadata for {}: {:?}", &torrent.name, e);
                continue;
            }
        };

        let category = match derive_category(Some(&metadata)) {
            Some(category) => category,
            None => {
                warn!("no category could be derived for {}", &torrent.name);
                continue;
            }
        };

        if let Err(e) = torrents_handler.set_category(&torrent.hash, &category).await {
            error!("could not set category {:?} on {}: {:?}", &category, &torrent.name, e);
            continue;
        }
        info!("updated category of {} to {:?}", &torrent.name, &category);

        // the category sticks even if tagging fails, worst case the torrent
        // is looked at again on the next run
        if let Err(e) = torrents_handler.add_tags(&torrent.hash, PROCESSED_TAG).await {
            warn!("could not tag {} as processed: {:?}", &torrent.name, e);
        }

        updated += 1;
    }

    Ok(updated)
}
