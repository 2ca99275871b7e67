use chrono::{DateTime, Local};

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_played_at_display(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

/// Collapses the whitespace of serialized markup onto one line.
pub(crate) fn single_line(markup: &str) -> String {
    markup.split_whitespace().collect::<Vec<_>>().join(" ")
}
