mod display;
mod identifier;
mod pipeline;
mod player;
mod playlist;
mod scrape;
mod tui;

#[cfg(test)]
mod tests;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde_json::json;

use crate::cli::{Cli, Command};
use crate::db::{Database, KvStore};
use crate::http::{Fetch, HttpFetcher};
use crate::paths::database_file_path;

use self::display::{format_played_at_display, truncate};
use self::pipeline::{Source, load_playlist};
use self::player::{ExternalPlayer, Player, run_chain};
use self::playlist::{EntryState, PLAYED_MARKER, PlaybackEntry, Playlist};

pub fn run(cli: Cli) -> Result<()> {
    let db = open_db()?;
    let fetcher = HttpFetcher::new(cli.timeout_secs.map(Duration::from_secs));
    let player = ExternalPlayer::from_env(cli.player);
    let source = Source {
        category_url: cli.category_url,
        item_prefix: cli.item_prefix,
    };

    match cli.command {
        Some(Command::List { json }) => run_list(&db, &fetcher, &source, json)?,
        Some(Command::Play { from }) => run_play(&db, &fetcher, &player, &source, from)?,
        Some(Command::Tui) | None => tui::run_tui(&db, &fetcher, &player, &source)?,
    }

    Ok(())
}

fn run_list(db: &Database, fetcher: &dyn Fetch, source: &Source, as_json: bool) -> Result<()> {
    let playlist = load_playlist(fetcher, db, source)?;

    if as_json {
        let rows = playlist
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let played_at = played_at(db, entry)?;
                Ok::<_, anyhow::Error>(json!({
                    "position": index + 1,
                    "identifier": entry.identifier.as_str(),
                    "played": entry.state() == EntryState::Played,
                    "played_at": played_at,
                    "source": entry.source(),
                    "markup": entry.media.as_ref().map(|media| media.markup.as_str()),
                }))
            })
            .collect::<Result<Vec<_>>>()?;
        let out = serde_json::to_string_pretty(&rows).context("failed to encode playlist")?;
        println!("{out}");
        return Ok(());
    }

    if playlist.is_empty() {
        println!("No episodes found at {}.", source.category_url);
        return Ok(());
    }

    println!(
        "{:<5} {:<22} {:<18} {:<50}",
        "#", "EPISODE", "LAST PLAYED", "SOURCE"
    );
    for (index, entry) in playlist.entries().iter().enumerate() {
        let played_at = played_at(db, entry)?
            .map(|raw| format_played_at_display(&raw))
            .unwrap_or_else(|| "-".to_string());
        let stream = match (&entry.media, entry.source()) {
            (_, Some(src)) => src.to_string(),
            (Some(_), None) => "(audio without source)".to_string(),
            (None, None) => "(no audio on page)".to_string(),
        };
        println!(
            "{:<5} {:<22} {:<18} {:<50}",
            index + 1,
            truncate(&entry.title_line(), 22),
            played_at,
            truncate(&stream, 50)
        );
    }
    let played = playlist
        .entries()
        .iter()
        .filter(|entry| entry.marker_shown())
        .count();
    println!("\n{played}/{} {PLAYED_MARKER}", playlist.len());
    Ok(())
}

fn run_play(
    db: &Database,
    fetcher: &dyn Fetch,
    player: &dyn Player,
    source: &Source,
    from: Option<u64>,
) -> Result<()> {
    let mut playlist = load_playlist(fetcher, db, source)?;
    if playlist.is_empty() {
        println!("No episodes found at {}.", source.category_url);
        return Ok(());
    }

    let start = match from {
        Some(position) => {
            let index = usize::try_from(position - 1).context("start position out of range")?;
            if index >= playlist.len() {
                bail!(
                    "start position {position} is past the last episode ({})",
                    playlist.len()
                );
            }
            index
        }
        None => playlist.first_unplayed().unwrap_or(0),
    };

    let report = play_chain(db, player, &mut playlist, start)?;
    println!("\n{report}");
    Ok(())
}

/// Runs the chain with the terminal owned by the player, printing progress.
fn play_chain(
    store: &dyn KvStore,
    player: &dyn Player,
    playlist: &mut Playlist,
    start: usize,
) -> Result<String> {
    let total = playlist.len();
    let report = run_chain(playlist, store, player, start, |index, identifier| {
        println!("\nNow playing {identifier} ({}/{total})", index + 1);
    })?;
    Ok(report.summary(playlist))
}

fn played_at(db: &Database, entry: &PlaybackEntry) -> Result<Option<String>> {
    if entry.state() != EntryState::Played {
        return Ok(None);
    }
    db.updated_at(&entry.identifier.storage_key())
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}
