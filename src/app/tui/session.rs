use std::io;

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

/// Raw-mode alternate screen, restored on drop.
pub(super) struct TuiSession {
    active: bool,
}

impl TuiSession {
    pub(super) fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(io::stdout(), EnterAlternateScreen).context("failed to enter alternate screen")?;
        Ok(Self { active: true })
    }

    /// Hands the plain terminal to `f` (player output, fetch logs) and
    /// takes it back afterwards, even when `f` fails.
    pub(super) fn suspended<T>(&mut self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.set_active(false)?;
        let result = f();
        self.set_active(true)?;
        result
    }

    pub(super) fn leave(mut self) -> Result<()> {
        self.set_active(false)
    }

    fn set_active(&mut self, active: bool) -> Result<()> {
        if self.active == active {
            return Ok(());
        }
        if active {
            execute!(io::stdout(), EnterAlternateScreen)
                .context("failed to re-enter alternate screen")?;
            enable_raw_mode().context("failed to re-enable raw mode")?;
        } else {
            disable_raw_mode().context("failed to disable raw mode")?;
            execute!(io::stdout(), LeaveAlternateScreen)
                .context("failed to leave alternate screen")?;
        }
        self.active = active;
        Ok(())
    }
}

impl Drop for TuiSession {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}
