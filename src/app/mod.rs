//! Application module
//!
//! The operator console: a live variable table, a change log fed by the
//! engine's change subscription, and a command bar that speaks the control
//! surface grammar.
//!
//! # Module Structure
//! - `state` - Application state types (AppState, AppMode, PickerState)
//! - Main module - App struct and event loop

mod state;

pub use state::{
    AppMode, AppState, LogEntry, LogKind, MAX_HISTORY_ENTRIES, MAX_LOG_ENTRIES, PickerState,
    UiAction,
};

use crate::components::keybindings::KeybindingContext;
use crate::control::{ControlSurface, Reply};
use crate::engine::{Engine, ValueChange};
use crate::error::Result;
use crate::ui::UiRenderer;
use crossterm::event::{Event, KeyEventKind};
use ratatui::{Terminal, backend::Backend};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main application struct
pub struct App {
    engine: Arc<Engine>,
    state: AppState,
    ui_renderer: UiRenderer,
    /// Keybinding context for dispatch, nav bar and help
    keybinding_context: KeybindingContext,
    /// Change feed from the engine (polled in main loop)
    changes: Receiver<ValueChange>,
}

impl App {
    /// Create a new application instance
    pub fn new(engine: Arc<Engine>) -> Result<Self> {
        info!("Creating new App instance");
        let changes = engine.subscribe()?;
        let mut state = AppState::new();
        state.update_variables(engine.list_variables()?);

        Ok(Self {
            engine,
            state,
            ui_renderer: UiRenderer::new(),
            keybinding_context: KeybindingContext::new(),
            changes,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Move pending change notifications into the log.
    /// Returns false once the engine has shut down.
    fn poll_changes(&mut self) -> bool {
        loop {
            match self.changes.try_recv() {
                Ok(change) => self.state.record_change(&change),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Run a command line and show the reply. Returns true on `quit`.
    ///
    /// This runs on the drawing thread, so a pause is refused.
    pub fn execute(&mut self, line: &str) -> bool {
        debug!("Console command: {}", line);
        match ControlSurface::new(&self.engine).execute_line(line) {
            Reply::Quit => true,
            Reply::Pause(_) => {
                self.state
                    .record_reply(&["✗ wait is only available in line mode".to_string()]);
                false
            }
            Reply::Lines(lines) => {
                self.state.record_reply(&lines);
                false
            }
        }
    }

    /// Run the main application loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!("Starting main application loop");

        loop {
            if !self.poll_changes() {
                warn!("Engine shut down, leaving console");
                break;
            }
            self.state.update_variables(self.engine.list_variables()?);

            terminal.draw(|f| {
                self.ui_renderer
                    .render(f, &self.state, &self.keybinding_context);
            })?;

            if crossterm::event::poll(Duration::from_millis(50))? {
                if let Event::Key(key_event) = crossterm::event::read()? {
                    if key_event.kind != KeyEventKind::Press {
                        continue;
                    }
                    match self.state.handle_key(&self.keybinding_context, key_event) {
                        Some(UiAction::Quit) => break,
                        Some(UiAction::Execute(line)) => {
                            if self.execute(&line) {
                                break;
                            }
                        }
                        None => {}
                    }
                }
            }
        }

        info!("Console closed");
        Ok(())
    }
}
