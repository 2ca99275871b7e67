use anyhow::Result;
use log::{debug, info};

use crate::db::KvStore;

use super::identifier::Identifier;
use super::scrape::MediaReference;

pub(crate) const PLAYED_VALUE: &str = "played";
pub(crate) const PLAYED_MARKER: &str = "[played]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryState {
    Unplayed,
    Playing,
    Played,
}

impl EntryState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Unplayed => "unplayed",
            Self::Playing => "playing",
            Self::Played => "played",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PlaybackEntry {
    pub(crate) identifier: Identifier,
    pub(crate) media: Option<MediaReference>,
    state: EntryState,
    marker_shown: bool,
}

impl PlaybackEntry {
    pub(crate) fn state(&self) -> EntryState {
        self.state
    }

    pub(crate) fn marker_shown(&self) -> bool {
        self.marker_shown
    }

    pub(crate) fn is_playable(&self) -> bool {
        self.media.is_some()
    }

    pub(crate) fn source(&self) -> Option<&str> {
        self.media.as_ref().and_then(|media| media.source.as_deref())
    }

    /// Row title: the identifier followed by the played marker once shown.
    pub(crate) fn title_line(&self) -> String {
        if self.marker_shown {
            format!("{} {PLAYED_MARKER}", self.identifier)
        } else {
            self.identifier.to_string()
        }
    }

    fn show_marker(&mut self) {
        if !self.marker_shown {
            self.marker_shown = true;
        }
    }
}

/// What happened to the chain after an entry finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// The next entry was started.
    Started(usize),
    /// The next entry exists but has no media to start.
    Stalled(usize),
    /// The finished entry was the last one.
    End,
    /// The signal did not refer to a playable entry.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Playlist {
    entries: Vec<PlaybackEntry>,
    current: Option<usize>,
}

impl Playlist {
    /// Builds the session playlist, reading each entry's played flag from
    /// `store`. Nothing is started.
    pub(crate) fn build(
        rows: Vec<(Identifier, Option<MediaReference>)>,
        store: &dyn KvStore,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(rows.len());
        for (identifier, media) in rows {
            let played = store.get(&identifier.storage_key())?.as_deref() == Some(PLAYED_VALUE);
            entries.push(PlaybackEntry {
                identifier,
                media,
                state: if played {
                    EntryState::Played
                } else {
                    EntryState::Unplayed
                },
                marker_shown: played,
            });
        }
        Ok(Self {
            entries,
            current: None,
        })
    }

    pub(crate) fn entries(&self) -> &[PlaybackEntry] {
        &self.entries
    }

    pub(crate) fn get(&self, index: usize) -> Option<&PlaybackEntry> {
        self.entries.get(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn current(&self) -> Option<usize> {
        self.current
    }

    pub(crate) fn first_unplayed(&self) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.is_playable() && entry.state != EntryState::Played)
    }

    /// External play trigger. Returns the media to hand to the player, or
    /// `None` when the index is out of range or the entry has no media.
    pub(crate) fn start(&mut self, index: usize) -> Option<&MediaReference> {
        if !self.entries.get(index).is_some_and(PlaybackEntry::is_playable) {
            return None;
        }

        // Only one entry plays at a time; an interrupted one never finished.
        if let Some(previous) = self.current
            && previous != index
            && let Some(entry) = self.entries.get_mut(previous)
            && entry.state == EntryState::Playing
        {
            entry.state = EntryState::Unplayed;
        }

        let entry = &mut self.entries[index];
        if entry.state == EntryState::Unplayed {
            entry.state = EntryState::Playing;
        }
        self.current = Some(index);
        debug!("started {}", entry.identifier);
        entry.media.as_ref()
    }

    /// Playback of the current entry stopped without finishing.
    pub(crate) fn interrupt(&mut self) {
        if let Some(index) = self.current.take()
            && let Some(entry) = self.entries.get_mut(index)
            && entry.state == EntryState::Playing
        {
            entry.state = EntryState::Unplayed;
        }
    }

    /// Media of entry `index` played to the end: persist, mark, and move on.
    ///
    /// The next entry is started whether or not it was played in an earlier
    /// session. The chain ends at the last entry.
    pub(crate) fn on_finished(&mut self, index: usize, store: &dyn KvStore) -> Result<Advance> {
        let Some(entry) = self.entries.get(index) else {
            return Ok(Advance::Ignored);
        };
        if !entry.is_playable() {
            return Ok(Advance::Ignored);
        }

        // Not persisted means not finished: the entry leaves the cursor unplayed.
        if let Err(err) = store.set(&entry.identifier.storage_key(), PLAYED_VALUE) {
            if self.current == Some(index) {
                self.interrupt();
            }
            return Err(err);
        }

        let entry = &mut self.entries[index];
        entry.state = EntryState::Played;
        entry.show_marker();
        info!("finished {}", entry.identifier);

        if self.current == Some(index) {
            self.current = None;
        }

        let next = index + 1;
        if next >= self.entries.len() {
            return Ok(Advance::End);
        }
        if self.start(next).is_some() {
            Ok(Advance::Started(next))
        } else {
            Ok(Advance::Stalled(next))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::identifier::test_id;
    use crate::db::memory::{FailingStore, MemoryStore};

    fn media(name: &str) -> Option<MediaReference> {
        Some(MediaReference {
            markup: format!("<audio src=\"{name}\"></audio>"),
            source: Some(format!("https://cdn.example/{name}")),
        })
    }

    fn rows(ids: &[&str]) -> Vec<(Identifier, Option<MediaReference>)> {
        ids.iter()
            .map(|id| (test_id(id), media(&format!("{id}.mp3"))))
            .collect()
    }

    #[test]
    fn build_reads_played_flags_without_starting_anything() {
        let store = MemoryStore::with_entries(&[
            ("radio-radio1", "played"),
            ("radio-radio2", "PLAYED"),
            ("radio-radio3", ""),
        ]);

        let playlist = Playlist::build(rows(&["radio1", "radio2", "radio3"]), &store)
            .expect("build playlist");

        let states = playlist
            .entries()
            .iter()
            .map(PlaybackEntry::state)
            .collect::<Vec<_>>();
        assert_eq!(
            states,
            vec![
                EntryState::Played,
                EntryState::Unplayed,
                EntryState::Unplayed
            ]
        );
        assert!(playlist.entries()[0].marker_shown());
        assert_eq!(playlist.entries()[0].title_line(), "radio1 [played]");
        assert_eq!(playlist.current(), None);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn finishing_persists_marks_and_starts_next() {
        let store = MemoryStore::default();
        let mut playlist =
            Playlist::build(rows(&["radio1", "radio3"]), &store).expect("build playlist");

        assert!(playlist.start(0).is_some());
        assert_eq!(playlist.entries()[0].state(), EntryState::Playing);

        let advance = playlist.on_finished(0, &store).expect("finish");
        assert_eq!(advance, Advance::Started(1));
        assert_eq!(
            store.writes(),
            vec![("radio-radio1".to_string(), "played".to_string())]
        );
        assert_eq!(playlist.entries()[0].state(), EntryState::Played);
        assert!(playlist.entries()[0].marker_shown());
        assert_eq!(playlist.entries()[1].state(), EntryState::Playing);
        assert_eq!(playlist.current(), Some(1));
    }

    #[test]
    fn autoplay_ignores_prior_played_status_of_next_entry() {
        let store = MemoryStore::with_entries(&[("radio-radio2", "played")]);
        let mut playlist =
            Playlist::build(rows(&["radio1", "radio2", "radio3"]), &store).expect("build");

        playlist.start(0);
        let advance = playlist.on_finished(0, &store).expect("finish");

        assert_eq!(advance, Advance::Started(1));
        assert_eq!(playlist.current(), Some(1));
        assert_eq!(playlist.entries()[1].state(), EntryState::Played);
    }

    #[test]
    fn finishing_twice_is_idempotent() {
        let store = MemoryStore::default();
        let mut playlist = Playlist::build(rows(&["radio1"]), &store).expect("build");

        playlist.start(0);
        playlist.on_finished(0, &store).expect("first finish");
        let once = store.snapshot();
        playlist.on_finished(0, &store).expect("second finish");

        assert_eq!(store.snapshot(), once);
        assert_eq!(once.get("radio-radio1").map(String::as_str), Some("played"));
        assert_eq!(playlist.entries()[0].title_line(), "radio1 [played]");
        assert_eq!(
            playlist.entries()[0]
                .title_line()
                .matches(PLAYED_MARKER)
                .count(),
            1
        );
    }

    #[test]
    fn failed_write_reverts_entry_and_clears_cursor() {
        let store = FailingStore::default();
        let mut playlist = Playlist::build(rows(&["radio1", "radio2"]), &store).expect("build");

        playlist.start(0);
        let err = playlist
            .on_finished(0, &store)
            .expect_err("write should fail");

        assert!(err.to_string().contains("disk full"), "{err}");
        assert_eq!(playlist.entries()[0].state(), EntryState::Unplayed);
        assert!(!playlist.entries()[0].marker_shown());
        assert_eq!(playlist.current(), None);
        assert_eq!(playlist.entries()[1].state(), EntryState::Unplayed);
    }

    #[test]
    fn chain_stops_at_last_entry_without_wrapping() {
        let store = MemoryStore::default();
        let mut playlist =
            Playlist::build(rows(&["radio1", "radio2", "radio3"]), &store).expect("build");

        playlist.start(2);
        let advance = playlist.on_finished(2, &store).expect("finish last");

        assert_eq!(advance, Advance::End);
        assert_eq!(playlist.current(), None);
        assert_eq!(playlist.entries()[0].state(), EntryState::Unplayed);
        assert_eq!(playlist.entries()[1].state(), EntryState::Unplayed);
    }

    #[test]
    fn entries_without_media_stay_aligned_but_never_play() {
        let store = MemoryStore::default();
        let mut playlist = Playlist::build(
            vec![
                (test_id("radio1"), media("one.mp3")),
                (test_id("radio2"), None),
                (test_id("radio3"), media("three.mp3")),
            ],
            &store,
        )
        .expect("build");

        assert_eq!(playlist.len(), 3);
        assert!(playlist.start(1).is_none());
        assert_eq!(playlist.on_finished(1, &store).expect("ignored"), Advance::Ignored);

        playlist.start(0);
        let advance = playlist.on_finished(0, &store).expect("finish");
        assert_eq!(advance, Advance::Stalled(1));
        assert_eq!(playlist.current(), None);
        assert_eq!(playlist.entries()[1].state(), EntryState::Unplayed);
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn out_of_range_signals_are_ignored() {
        let store = MemoryStore::default();
        let mut playlist = Playlist::build(rows(&["radio1"]), &store).expect("build");

        assert!(playlist.start(5).is_none());
        assert_eq!(playlist.on_finished(5, &store).expect("ignored"), Advance::Ignored);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn starting_another_entry_reverts_the_interrupted_one() {
        let store = MemoryStore::default();
        let mut playlist = Playlist::build(rows(&["radio1", "radio2"]), &store).expect("build");

        playlist.start(0);
        playlist.start(1);
        assert_eq!(playlist.entries()[0].state(), EntryState::Unplayed);
        assert_eq!(playlist.entries()[1].state(), EntryState::Playing);

        playlist.interrupt();
        assert_eq!(playlist.entries()[1].state(), EntryState::Unplayed);
        assert_eq!(playlist.current(), None);
    }

    #[test]
    fn first_unplayed_skips_played_and_unplayable_entries() {
        let store = MemoryStore::with_entries(&[("radio-radio1", "played")]);
        let playlist = Playlist::build(
            vec![
                (test_id("radio1"), media("one.mp3")),
                (test_id("radio2"), None),
                (test_id("radio3"), media("three.mp3")),
            ],
            &store,
        )
        .expect("build");

        assert_eq!(playlist.first_unplayed(), Some(2));
    }
}
