//! Raw-mode lifecycle
//!
//! [`RawMode`] remembers whether the terminal was already raw when it was
//! enabled and restores exactly that state. Dropping the guard restores the
//! terminal too, so an early return or a panic unwinding through the shell
//! never leaves the user's shell in raw mode.

use clusage_core::error::{ClusageError, Result};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled};
use is_terminal::IsTerminal;
use tracing::debug;

/// Guard over the terminal's raw mode
#[derive(Debug, Default)]
pub struct RawMode {
    active: bool,
    was_raw: bool,
}

impl RawMode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch stdin to raw mode
    ///
    /// Fails with [`ClusageError::TerminalNotInteractive`] when stdin is
    /// not a terminal. Calling it again while active does nothing.
    pub fn enable(&mut self) -> Result<()> {
        if !std::io::stdin().is_terminal() {
            return Err(ClusageError::TerminalNotInteractive);
        }
        if self.active {
            return Ok(());
        }
        self.was_raw = is_raw_mode_enabled()?;
        if !self.was_raw {
            enable_raw_mode()?;
        }
        self.active = true;
        debug!("Raw mode enabled (was raw: {})", self.was_raw);
        Ok(())
    }

    /// Restore the mode the terminal had before [`RawMode::enable`]
    pub fn disable(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if !self.was_raw {
            disable_raw_mode()?;
        }
        debug!("Raw mode restored");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = self.disable() {
            debug!("Failed to restore terminal mode on drop: {}", e);
        }
    }
}
