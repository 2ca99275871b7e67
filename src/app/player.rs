mod process;

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command as ProcessCommand, Stdio};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::db::KvStore;

use super::identifier::Identifier;
use super::playlist::{Advance, Playlist};
use super::scrape::MediaReference;

use self::process::run_in_foreground;

const DEFAULT_PLAYER: &str = "mpv";
const DEFAULT_PLAYER_ARGS: &str = "--no-video";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaybackOutcome {
    pub(crate) success: bool,
    pub(crate) failure_detail: Option<String>,
}

impl PlaybackOutcome {
    pub(crate) fn finished() -> Self {
        Self {
            success: true,
            failure_detail: None,
        }
    }

    pub(crate) fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            failure_detail: Some(detail.into()),
        }
    }
}

/// Plays one media item to completion. A successful outcome is the
/// "finished" signal that advances the chain.
pub(crate) trait Player {
    fn play(&self, identifier: &Identifier, media: &MediaReference) -> Result<PlaybackOutcome>;
}

#[derive(Debug, Clone)]
pub(crate) struct ExternalPlayer {
    bin: PathBuf,
    args: Vec<String>,
}

impl ExternalPlayer {
    pub(crate) fn from_env(bin_override: Option<PathBuf>) -> Self {
        let bin = bin_override
            .unwrap_or_else(|| resolve_player_bin_from_env(env::var_os("RADIOTRACK_PLAYER_BIN")));
        let args = resolve_player_args_from_env(env::var_os("RADIOTRACK_PLAYER_ARGS"));
        Self { bin, args }
    }
}

impl Player for ExternalPlayer {
    fn play(&self, identifier: &Identifier, media: &MediaReference) -> Result<PlaybackOutcome> {
        let Some(source) = media.source.as_deref() else {
            return Ok(PlaybackOutcome::failed(format!(
                "{identifier} has no playable source"
            )));
        };

        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.args(&self.args)
            .arg(source)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        let status = run_in_foreground(cmd)
            .with_context(|| format!("failed to launch {}", self.bin.display()))?;

        if status.success() {
            Ok(PlaybackOutcome::finished())
        } else {
            Ok(PlaybackOutcome::failed(format!(
                "player exited with status: {status}"
            )))
        }
    }
}

pub(crate) fn resolve_player_bin_from_env(env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_PLAYER),
    }
}

pub(crate) fn resolve_player_args_from_env(env_value: Option<OsString>) -> Vec<String> {
    let raw = env_value
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_PLAYER_ARGS.to_string());
    raw.split_whitespace().map(str::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChainStop {
    /// The last entry finished.
    End,
    /// The chain reached an entry with no media.
    Stalled(usize),
    /// The requested start entry cannot be played.
    NotPlayable(usize),
    /// The player stopped before the entry finished.
    Interrupted { index: usize, detail: String },
}

#[derive(Debug, Clone)]
pub(crate) struct ChainReport {
    pub(crate) finished: Vec<Identifier>,
    pub(crate) stop: ChainStop,
}

impl ChainReport {
    pub(crate) fn summary(&self, playlist: &Playlist) -> String {
        let label = |index: usize| {
            playlist
                .get(index)
                .map(|entry| entry.identifier.to_string())
                .unwrap_or_else(|| format!("#{index}"))
        };
        let finished = match self.finished.len() {
            0 => "Nothing finished".to_string(),
            1 => format!("Finished {}", self.finished[0]),
            n => format!(
                "Finished {n} entries ({} .. {})",
                self.finished[0],
                self.finished[n - 1]
            ),
        };
        match &self.stop {
            ChainStop::End => format!("{finished}. Reached the end of the playlist."),
            ChainStop::Stalled(index) => {
                format!("{finished}. Stopped at {}: no media on its page.", label(*index))
            }
            ChainStop::NotPlayable(index) => {
                format!("{finished}. {} has no media to play.", label(*index))
            }
            ChainStop::Interrupted { index, detail } => format!(
                "{finished}. Playback of {} interrupted: {detail}. Not marked as played.",
                label(*index)
            ),
        }
    }
}

/// Starts entry `start` and keeps feeding finished signals back into the
/// playlist until the chain ends, stalls, or the player is interrupted.
pub(crate) fn run_chain(
    playlist: &mut Playlist,
    store: &dyn KvStore,
    player: &dyn Player,
    start: usize,
    mut on_start: impl FnMut(usize, &Identifier),
) -> Result<ChainReport> {
    let mut finished = Vec::new();
    let mut index = start;
    if playlist.start(index).is_none() {
        return Ok(ChainReport {
            finished,
            stop: ChainStop::NotPlayable(index),
        });
    }

    loop {
        let Some((identifier, media)) = playlist
            .get(index)
            .and_then(|entry| Some((entry.identifier.clone(), entry.media.clone()?)))
        else {
            playlist.interrupt();
            return Ok(ChainReport {
                finished,
                stop: ChainStop::NotPlayable(index),
            });
        };

        on_start(index, &identifier);
        info!("playing {identifier}");
        let outcome = match player.play(&identifier, &media) {
            Ok(outcome) => outcome,
            Err(err) => {
                playlist.interrupt();
                return Err(err);
            }
        };
        if !outcome.success {
            playlist.interrupt();
            let detail = outcome
                .failure_detail
                .unwrap_or_else(|| "playback failed".to_string());
            warn!("{identifier} did not finish: {detail}");
            return Ok(ChainReport {
                finished,
                stop: ChainStop::Interrupted { index, detail },
            });
        }

        let advance = match playlist.on_finished(index, store) {
            Ok(advance) => advance,
            Err(err) => {
                playlist.interrupt();
                return Err(err);
            }
        };
        finished.push(identifier);
        match advance {
            Advance::Started(next) => index = next,
            Advance::Stalled(next) => {
                return Ok(ChainReport {
                    finished,
                    stop: ChainStop::Stalled(next),
                });
            }
            Advance::End | Advance::Ignored => {
                return Ok(ChainReport {
                    finished,
                    stop: ChainStop::End,
                });
            }
        }
    }
}
