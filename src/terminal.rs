//! Raw mode and alternate screen handling for the binary.

use std::io;

use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::warn;

/// Runs `restore` when dropped.
pub struct RestoreGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> RestoreGuard<F> {
    pub fn new(restore: F) -> Self {
        Self { restore }
    }
}

impl<F: FnMut()> Drop for RestoreGuard<F> {
    fn drop(&mut self) {
        (self.restore)()
    }
}

/// Leaves raw mode and the alternate screen, logging rather than failing.
pub fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        warn!(error = %e, "could not disable raw mode");
    }
    if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, Show) {
        warn!(error = %e, "could not leave alternate screen");
    }
}

/// Switches to raw mode and the alternate screen.
///
/// The returned guard restores the terminal on drop, and a failure after raw
/// mode is enabled restores it before the error is returned.
pub fn enter() -> io::Result<RestoreGuard<fn()>> {
    enable_raw_mode()?;
    let guard = RestoreGuard::new(restore_terminal as fn());
    execute!(io::stdout(), EnterAlternateScreen)?;
    Ok(guard)
}
