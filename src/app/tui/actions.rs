use super::super::playlist::Playlist;

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

/// Where the cursor lands after a (re)load: the first episode still to hear.
pub(crate) fn initial_selection(playlist: &Playlist) -> Option<usize> {
    if playlist.is_empty() {
        return None;
    }
    Some(playlist.first_unplayed().unwrap_or(0))
}

pub(crate) fn move_selection(selected: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = selected.unwrap_or(0);
    let moved = current.saturating_add_signed(delta);
    Some(moved.min(len - 1))
}

pub(crate) fn clamp_selection(selected: Option<usize>, len: usize) -> Option<usize> {
    match (selected, len) {
        (_, 0) => None,
        (Some(idx), len) => Some(idx.min(len - 1)),
        (None, _) => Some(0),
    }
}

pub(super) fn loaded_message(playlist: &Playlist) -> String {
    if playlist.is_empty() {
        return status_info("No episodes found. Press r to reload.");
    }
    let played = playlist
        .entries()
        .iter()
        .filter(|entry| entry.marker_shown())
        .count();
    status_info(&format!(
        "Loaded {} episodes, {played} already played.",
        playlist.len()
    ))
}
