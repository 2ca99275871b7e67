use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use super::super::display::{single_line, truncate};
use super::super::pipeline::Source;
use super::super::playlist::{EntryState, PLAYED_MARKER, PlaybackEntry, Playlist};

const ACCENT: Color = Color::Rgb(110, 170, 255);
const MUTED: Color = Color::Rgb(185, 195, 210);
const PLAYED: Color = Color::Rgb(120, 200, 140);

pub(super) fn draw_tui(
    frame: &mut Frame,
    playlist: &Playlist,
    table_state: &mut TableState,
    status: &str,
    source: &Source,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let played = playlist
        .entries()
        .iter()
        .filter(|entry| entry.marker_shown())
        .count();
    let selected_text = table_state
        .selected()
        .map(|idx| (idx + 1).to_string())
        .unwrap_or_else(|| "-".to_string());
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "RADIOTRACK",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{} episodes", playlist.len()),
            Style::default().fg(MUTED),
        ),
        Span::raw("   "),
        Span::styled(format!("{played} played"), Style::default().fg(PLAYED)),
        Span::raw("   "),
        Span::styled(
            format!("selected {selected_text}"),
            Style::default().fg(MUTED),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Playlist"));
    frame.render_widget(header, chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let rows: Vec<Row> = playlist
        .entries()
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let style = if entry.marker_shown() {
                Style::default().fg(PLAYED)
            } else if entry.is_playable() {
                Style::default().fg(Color::Rgb(230, 230, 230))
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Row::new(vec![
                Cell::from((idx + 1).to_string()),
                Cell::from(entry.title_line()),
                Cell::from(status_label(entry, playlist.current() == Some(idx))),
                Cell::from(if entry.is_playable() { "audio" } else { "-" }),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Percentage(50),
            Constraint::Length(10),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["#", "Episode", "Status", "Media"])
            .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    )
    .block(panel_block("Episodes"))
    .row_highlight_style(
        Style::default()
            .bg(ACCENT)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, body_chunks[0], table_state);

    let details = match table_state.selected().and_then(|idx| playlist.get(idx)) {
        Some(entry) => detail_text(entry),
        None => format!(
            "No episodes found.\n\nSource\n{}\n\nPress r to reload.",
            truncate(&source.category_url, 60)
        ),
    };
    let selection = Paragraph::new(details)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .wrap(Wrap { trim: false })
        .block(panel_block("Selected"));
    frame.render_widget(selection, body_chunks[1]);

    let controls = Paragraph::new(Line::from(Span::styled(
        "↑/↓ move  PgUp/PgDn page  Enter play from here  r reload  q quit",
        Style::default().fg(MUTED),
    )))
    .alignment(Alignment::Center)
    .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);
}

fn status_label(entry: &PlaybackEntry, is_current: bool) -> &'static str {
    if is_current {
        return EntryState::Playing.label();
    }
    match entry.state() {
        EntryState::Played => PLAYED_MARKER,
        state => state.label(),
    }
}

fn detail_text(entry: &PlaybackEntry) -> String {
    let source = entry.source().unwrap_or("-");
    let markup = entry
        .media
        .as_ref()
        .map(|media| truncate(&single_line(&media.markup), 160))
        .unwrap_or_else(|| "no <audio> on the page".to_string());
    format!(
        "Episode\n{}\n\nStatus\n{}\n\nSource\n{}\n\nMarkup\n{}",
        entry.title_line(),
        entry.state().label(),
        truncate(source, 120),
        markup,
    )
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}
