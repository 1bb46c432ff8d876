//! Process lifecycle: signals and terminal state
//!
//! A simulator killed with Ctrl+C (or SIGTERM from a test harness) must not
//! leave threads mid-wait or the terminal in raw mode. The signal thread
//! shuts the engine down, restores the terminal if the TUI owns it, and
//! exits with 128 + signal number.
//!
//! `TerminalGuard` covers the normal and panic exit paths: dropping it
//! leaves the alternate screen and disables raw mode.

use crate::engine::Engine;
use crate::error::{Result, SimError};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use std::io::stdout;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Set while the TUI owns the terminal
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Put the terminal back into cooked mode on the main screen.
/// Does nothing unless a `TerminalGuard` is alive.
pub fn restore_terminal() {
    if TERMINAL_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(stdout(), LeaveAlternateScreen);
        debug!("Terminal restored");
    }
}

/// RAII guard for raw mode plus the alternate screen
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn acquire() -> Result<Self> {
        enable_raw_mode()
            .map_err(|e| SimError::terminal(format!("Failed to enable raw mode: {}", e)))?;
        TERMINAL_ACTIVE.store(true, Ordering::SeqCst);
        if let Err(e) = crossterm::execute!(stdout(), EnterAlternateScreen) {
            restore_terminal();
            return Err(SimError::terminal(format!(
                "Failed to enter alternate screen: {}",
                e
            )));
        }
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Initialize signal handlers for graceful shutdown.
/// Handles SIGINT (Ctrl+C), SIGTERM, and SIGHUP.
/// Call this once at program start, after the engine exists.
pub fn init_signal_handlers(engine: Arc<Engine>) -> std::io::Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::thread;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                let signal_name = match sig {
                    SIGINT => "SIGINT",
                    SIGTERM => "SIGTERM",
                    SIGHUP => "SIGHUP",
                    _ => "UNKNOWN",
                };

                info!("Received {} signal, shutting down...", signal_name);
                engine.shutdown();
                restore_terminal();

                std::process::exit(128 + sig);
            }
            warn!("Signal iterator closed");
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_without_guard_is_noop() {
        assert!(!TERMINAL_ACTIVE.load(Ordering::SeqCst));
        restore_terminal();
        assert!(!TERMINAL_ACTIVE.load(Ordering::SeqCst));
    }
}
