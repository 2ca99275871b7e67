mod actions;
mod render;
mod session;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use crate::db::Database;
use crate::http::Fetch;

use super::pipeline::{Source, load_playlist};
use super::play_chain;
use super::player::Player;

pub(crate) use self::actions::{clamp_selection, initial_selection, move_selection};
use self::actions::{loaded_message, status_error, status_info};
use self::render::draw_tui;
use self::session::TuiSession;

const PAGE_STEP: isize = 10;

pub(crate) fn run_tui(
    db: &Database,
    fetcher: &dyn Fetch,
    player: &dyn Player,
    source: &Source,
) -> Result<()> {
    // Load before taking over the screen so fetch errors stay readable.
    let mut playlist = load_playlist(fetcher, db, source)?;

    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut table_state = TableState::default();
    table_state.select(initial_selection(&playlist));
    let mut status = loaded_message(&playlist);

    loop {
        terminal.draw(|frame| draw_tui(frame, &playlist, &mut table_state, &status, source))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let len = playlist.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Up | KeyCode::Char('k') => {
                table_state.select(move_selection(table_state.selected(), len, -1));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                table_state.select(move_selection(table_state.selected(), len, 1));
            }
            KeyCode::PageUp => {
                table_state.select(move_selection(table_state.selected(), len, -PAGE_STEP));
            }
            KeyCode::PageDown => {
                table_state.select(move_selection(table_state.selected(), len, PAGE_STEP));
            }
            KeyCode::Home => table_state.select((len > 0).then_some(0)),
            KeyCode::End => table_state.select(len.checked_sub(1)),
            KeyCode::Char('r') => {
                let result = session.suspended(|| {
                    println!("Reloading {} ...", source.category_url);
                    load_playlist(fetcher, db, source)
                });
                terminal.clear()?;

                match result {
                    Ok(reloaded) => {
                        playlist = reloaded;
                        table_state.select(clamp_selection(table_state.selected(), playlist.len()));
                        status = loaded_message(&playlist);
                    }
                    Err(err) => status = status_error(&format!("Reload failed: {err}")),
                }
            }
            KeyCode::Enter => {
                let Some(selected) = table_state.selected() else {
                    continue;
                };
                let Some(entry) = playlist.get(selected) else {
                    continue;
                };
                if !entry.is_playable() {
                    status = status_error(&format!("{} has no audio to play.", entry.identifier));
                    continue;
                }

                let result =
                    session.suspended(|| play_chain(db, player, &mut playlist, selected));
                terminal.clear()?;

                match result {
                    Ok(summary) => status = status_info(&summary),
                    Err(err) => status = status_error(&format!("Playback failed: {err}")),
                }
            }
            _ => {}
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
