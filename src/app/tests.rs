use super::identifier::derive_id;
use super::pipeline::{Source, collect_rows, load_playlist};
use super::player::fake::ScriptedPlayer;
use super::player::{ChainStop, run_chain};
use super::playlist::{Advance, EntryState};
use super::tui::{clamp_selection, initial_selection, move_selection};
use crate::db::memory::MemoryStore;
use crate::db::{Database, KvStore};
use crate::http::fake::FakeSite;

const CATEGORY: &str = "https://fc.vspo.jp/ja/gallery/category/radio";

fn source() -> Source {
    Source {
        category_url: CATEGORY.to_string(),
        item_prefix: "https://fc.vspo.jp/ja/gallery/radio".to_string(),
    }
}

fn category_page(hrefs: &[&str]) -> String {
    let anchors = hrefs
        .iter()
        .map(|href| format!("<li><a href=\"{href}\">episode</a></li>"))
        .collect::<String>();
    format!("<html><body><ul>{anchors}</ul></body></html>")
}

fn item_page(file: &str) -> String {
    format!(
        "<html><body><h1>episode</h1><audio controls src=\"/media/{file}\"></audio>\
         <audio src=\"/media/extra.mp3\"></audio></body></html>"
    )
}

fn scenario_site() -> FakeSite {
    FakeSite::default()
        .with_page(
            CATEGORY,
            &category_page(&[
                "/ja/gallery/radio3",
                "/ja/gallery/radio1",
                "/ja/gallery/radio3",
                "/ja/other/page",
            ]),
        )
        .with_page("https://fc.vspo.jp/ja/gallery/radio1", &item_page("one.mp3"))
        .with_page("https://fc.vspo.jp/ja/gallery/radio3", &item_page("three.mp3"))
}

#[test]
fn end_to_end_discovery_extraction_and_first_finish() {
    let site = scenario_site();
    let store = MemoryStore::default();

    let mut playlist = load_playlist(&site, &store, &source()).expect("load playlist");

    let ids = playlist
        .entries()
        .iter()
        .map(|entry| entry.identifier.to_string())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["radio1", "radio3"]);
    assert!(
        playlist
            .entries()
            .iter()
            .all(|entry| entry.state() == EntryState::Unplayed && !entry.marker_shown())
    );
    assert_eq!(
        playlist.entries()[0].source(),
        Some("https://fc.vspo.jp/media/one.mp3")
    );
    assert_eq!(
        playlist.entries()[1].source(),
        Some("https://fc.vspo.jp/media/three.mp3")
    );
    assert_eq!(playlist.current(), None);

    playlist.start(0).expect("entry 0 is playable");
    let advance = playlist.on_finished(0, &store).expect("finish entry 0");

    assert_eq!(advance, Advance::Started(1));
    assert_eq!(
        store.get("radio-radio1").expect("get").as_deref(),
        Some("played")
    );
    assert!(playlist.entries()[0].marker_shown());
    assert_eq!(playlist.entries()[0].title_line(), "radio1 [played]");
    assert_eq!(playlist.current(), Some(1));
    assert_eq!(playlist.entries()[1].state(), EntryState::Playing);
}

#[test]
fn every_discovered_link_is_fetched_once() {
    let site = scenario_site();

    collect_rows(&site, &source());

    let mut requested = site.requested();
    requested.sort();
    assert_eq!(
        requested,
        vec![
            "https://fc.vspo.jp/ja/gallery/category/radio".to_string(),
            "https://fc.vspo.jp/ja/gallery/radio1".to_string(),
            "https://fc.vspo.jp/ja/gallery/radio3".to_string(),
        ]
    );
}

#[test]
fn identifiers_and_media_stay_paired_when_rows_are_dropped() {
    let site = FakeSite::default()
        .with_page(
            CATEGORY,
            &category_page(&[
                "/ja/gallery/radio5",
                "/ja/gallery/radio-special",
                "/ja/gallery/radio2",
            ]),
        )
        .with_page(
            "https://fc.vspo.jp/ja/gallery/radio-special",
            &item_page("special.mp3"),
        )
        .with_page("https://fc.vspo.jp/ja/gallery/radio2", &item_page("two.mp3"));

    let rows = collect_rows(&site, &source());

    assert!(
        site.requested()
            .contains(&"https://fc.vspo.jp/ja/gallery/radio-special".to_string())
    );
    let pairs = rows
        .iter()
        .map(|(id, media)| {
            (
                id.to_string(),
                media.as_ref().and_then(|media| media.source.clone()),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        pairs,
        vec![
            (
                "radio2".to_string(),
                Some("https://fc.vspo.jp/media/two.mp3".to_string())
            ),
            ("radio5".to_string(), None),
        ]
    );
}

#[test]
fn unreachable_category_page_yields_empty_playlist() {
    let site = FakeSite::default();
    let store = MemoryStore::default();

    let playlist = load_playlist(&site, &store, &source()).expect("load playlist");

    assert!(playlist.is_empty());
    assert_eq!(initial_selection(&playlist), None);
    assert_eq!(site.requested(), vec![CATEGORY.to_string()]);
}

#[test]
fn played_state_survives_across_sessions() {
    let db = Database::open_in_memory().expect("open db");
    db.migrate().expect("migrate");
    let site = scenario_site();
    let player = ScriptedPlayer::default();

    let mut first = load_playlist(&site, &db, &source()).expect("first session");
    let report = run_chain(&mut first, &db, &player, 0, |_, _| {}).expect("chain");
    assert_eq!(report.stop, ChainStop::End);
    assert_eq!(player.played(), vec!["radio1", "radio3"]);

    let second = load_playlist(&site, &db, &source()).expect("second session");
    assert!(
        second
            .entries()
            .iter()
            .all(|entry| entry.state() == EntryState::Played && entry.marker_shown())
    );
    assert_eq!(second.first_unplayed(), None);
    assert_eq!(initial_selection(&second), Some(0));
}

#[test]
fn resuming_selects_first_unplayed_entry() {
    let store = MemoryStore::with_entries(&[("radio-radio1", "played")]);
    let playlist = load_playlist(&scenario_site(), &store, &source()).expect("load");

    assert_eq!(initial_selection(&playlist), Some(1));
}

#[test]
fn derive_id_matches_documented_examples() {
    assert_eq!(
        derive_id("https://x/a/b/radio42/y").map(|id| id.to_string()),
        Some("radio42".to_string())
    );
    assert_eq!(derive_id("https://x/other"), None);
}

#[test]
fn selection_moves_stay_in_bounds() {
    assert_eq!(move_selection(Some(0), 3, -1), Some(0));
    assert_eq!(move_selection(Some(1), 3, 1), Some(2));
    assert_eq!(move_selection(Some(2), 3, 1), Some(2));
    assert_eq!(move_selection(Some(1), 3, 10), Some(2));
    assert_eq!(move_selection(None, 3, 1), Some(1));
    assert_eq!(move_selection(Some(1), 0, 1), None);
}

#[test]
fn selection_is_clamped_after_reload() {
    assert_eq!(clamp_selection(Some(5), 3), Some(2));
    assert_eq!(clamp_selection(Some(1), 3), Some(1));
    assert_eq!(clamp_selection(None, 3), Some(0));
    assert_eq!(clamp_selection(Some(1), 0), None);
}
