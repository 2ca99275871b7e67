use std::thread;

use anyhow::Result;
use log::{debug, error, info};

use crate::db::KvStore;
use crate::http::Fetch;

use super::identifier::{Identifier, derive_id};
use super::playlist::Playlist;
use super::scrape::{MediaReference, discover, first_media};

/// Where the episodes live.
#[derive(Debug, Clone)]
pub(crate) struct Source {
    pub(crate) category_url: String,
    pub(crate) item_prefix: String,
}

/// Discovers, extracts, and builds the session playlist.
pub(crate) fn load_playlist(
    fetcher: &dyn Fetch,
    store: &dyn KvStore,
    source: &Source,
) -> Result<Playlist> {
    let rows = collect_rows(fetcher, source);
    info!("loaded {} episodes from {}", rows.len(), source.category_url);
    Playlist::build(rows, store)
}

pub(crate) fn collect_rows(
    fetcher: &dyn Fetch,
    source: &Source,
) -> Vec<(Identifier, Option<MediaReference>)> {
    let links = discover(fetcher, &source.category_url, &source.item_prefix);
    align(extract_all(fetcher, &links))
}

/// First media of every link, paired with the link it came from. All
/// requests are in flight before any is awaited; results keep link order.
pub(crate) fn extract_all(
    fetcher: &dyn Fetch,
    links: &[String],
) -> Vec<(String, Option<MediaReference>)> {
    thread::scope(|scope| {
        let handles = links
            .iter()
            .map(|link| (link, scope.spawn(move || first_media(fetcher, link))))
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|(link, handle)| {
                let media = handle.join().unwrap_or_else(|_| {
                    error!("media extraction for {link} panicked");
                    None
                });
                (link.clone(), media)
            })
            .collect()
    })
}

/// Derives each link's identifier and drops the links that carry no radio
/// number, keeping every identifier with the media of its own page.
pub(crate) fn align(
    extracted: Vec<(String, Option<MediaReference>)>,
) -> Vec<(Identifier, Option<MediaReference>)> {
    extracted
        .into_iter()
        .filter_map(|(link, media)| match derive_id(&link) {
            Some(identifier) => Some((identifier, media)),
            None => {
                debug!("dropping {link}: no radio number in url");
                None
            }
        })
        .collect()
}
