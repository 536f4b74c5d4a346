//! Terminal mode guard: raw mode and alternate screen for the engine's lifetime.

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;
use tracing::debug;

/// Puts the terminal into raw mode (and optionally the alternate screen)
/// and restores it when dropped.
pub struct TerminalGuard {
    alternate_screen: bool,
}

impl TerminalGuard {
    /// Enter raw mode, hide the cursor and optionally switch to the
    /// alternate screen buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal rejects any of the mode changes.
    pub fn enter(alternate_screen: bool) -> io::Result<Self> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        if alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
        }
        execute!(stdout, cursor::Hide)?;
        debug!(alternate_screen, "terminal entered raw mode");

        Ok(Self { alternate_screen })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::Show);
        if self.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
        debug!("terminal restored");
    }
}
