//! Terminal state guard for RAII cleanup.
//!
//! Restores the terminal even if the panel loop panics or returns early.

use crossterm::{
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};

/// Guard that restores the terminal on drop (including panics).
///
/// When dropped, this guard disables raw mode, leaves the alternate screen
/// and shows the cursor.
///
/// # Example
///
/// ```ignore
/// enable_raw_mode()?;
/// execute!(stdout(), EnterAlternateScreen)?;
/// let _guard = TerminalGuard::new();
/// // run the panel loop; the guard cleans up when it goes out of scope
/// ```
#[derive(Debug)]
pub struct TerminalGuard;

impl TerminalGuard {
    /// Creates a new terminal guard.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Best-effort terminal restore, shared with the panic hook.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
}
