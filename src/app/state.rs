//! Application state definitions
//!
//! Everything the operator console shows and every key it accepts lives
//! here, independent of the terminal, so the behavior can be tested
//! without drawing. Keys that change the simulation do not touch the
//! engine; they turn into a control-surface command line (`UiAction`)
//! that the run loop executes.

use crate::components::keybindings::{KeyAction, KeybindingContext};
use crate::engine::{ChangeOrigin, ValueChange, VariableInfo};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::time::Instant;

/// Entries kept in the change log
pub const MAX_LOG_ENTRIES: usize = 500;

/// Command lines kept for recall
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Application operating modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppMode {
    /// Variable table with the change log
    #[default]
    VariableList,
    /// Choosing one allowed value of an enumerated variable
    ValuePicker,
    /// Typing a command line
    CommandInput,
}

/// What the run loop should do after a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Run a control-surface command line
    Execute(String),
    Quit,
}

/// Value picker popup for enumerated variables
#[derive(Debug, Clone, PartialEq)]
pub struct PickerState {
    pub variable: String,
    pub options: Vec<String>,
    pub selected: usize,
    /// Hold time typed by the operator; empty means permanent
    pub duration: String,
}

impl PickerState {
    /// The command line this picker would run
    pub fn command(&self) -> String {
        let value = self.options.get(self.selected).map_or("", String::as_str);
        if self.duration.is_empty() {
            format!("set {} {}", self.variable, value)
        } else {
            format!("set {} {} for {}", self.variable, value, self.duration)
        }
    }
}

/// Kind of change-log entry, used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Change(ChangeOrigin),
    Reply,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Seconds since the console started
    pub elapsed: f64,
    pub text: String,
    pub kind: LogKind,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: AppMode,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Latest snapshot of every variable
    pub variables: Vec<VariableInfo>,
    /// Selected row in the variable table
    pub selected: usize,
    pub picker: Option<PickerState>,
    /// Command line being typed
    pub command: String,
    /// Previously executed command lines, oldest first
    pub history: Vec<String>,
    history_pos: Option<usize>,
    /// Change log, oldest first
    pub log: VecDeque<LogEntry>,
    /// Status message for user feedback
    pub status_message: String,
    started: Instant,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::VariableList,
            help_visible: false,
            variables: Vec::new(),
            selected: 0,
            picker: None,
            command: String::new(),
            history: Vec::new(),
            history_pos: None,
            log: VecDeque::new(),
            status_message: "Press ? for help".to_string(),
            started: Instant::now(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the variable snapshot, keeping the selection in range
    pub fn update_variables(&mut self, variables: Vec<VariableInfo>) {
        self.variables = variables;
        if self.selected >= self.variables.len() {
            self.selected = self.variables.len().saturating_sub(1);
        }
    }

    pub fn selected_variable(&self) -> Option<&VariableInfo> {
        self.variables.get(self.selected)
    }

    /// Append a store change to the log
    pub fn record_change(&mut self, change: &ValueChange) {
        let elapsed = change
            .at
            .saturating_duration_since(self.started)
            .as_secs_f64();
        self.push_log(LogEntry {
            elapsed,
            text: format!("{} = {} ({})", change.name, change.value, change.origin),
            kind: LogKind::Change(change.origin),
        });
    }

    /// Show a control-surface reply in the log and the status bar
    pub fn record_reply(&mut self, lines: &[String]) {
        let elapsed = self.started.elapsed().as_secs_f64();
        for line in lines {
            self.push_log(LogEntry {
                elapsed,
                text: line.clone(),
                kind: LogKind::Reply,
            });
        }
        if let Some(last) = lines.last() {
            self.status_message = last.clone();
        }
    }

    fn push_log(&mut self, entry: LogEntry) {
        if self.log.len() == MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
        self.log.push_back(entry);
    }

    fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.variables.len() {
            self.selected += 1;
        }
    }

    fn open_command(&mut self, prefill: String) {
        self.command = prefill;
        self.history_pos = None;
        self.mode = AppMode::CommandInput;
    }

    /// Enter on a variable: pick from its allowed values, or type a number
    fn open_selected(&mut self) {
        let Some(info) = self.selected_variable() else {
            return;
        };
        if info.domain.is_continuous() {
            let prefill = format!("set {} ", info.name);
            self.open_command(prefill);
            return;
        }

        let options: Vec<String> = info.domain.allowed().iter().map(|v| v.to_string()).collect();
        let selected = info
            .domain
            .allowed()
            .iter()
            .position(|v| *v == info.value)
            .unwrap_or(0);
        self.picker = Some(PickerState {
            variable: info.name.clone(),
            options,
            selected,
            duration: String::new(),
        });
        self.mode = AppMode::ValuePicker;
    }

    fn close_picker(&mut self) {
        self.picker = None;
        self.mode = AppMode::VariableList;
    }

    fn recall(&mut self, older: bool) {
        if self.history.is_empty() {
            return;
        }
        let last = self.history.len() - 1;
        let pos = match (self.history_pos, older) {
            (None, true) => Some(last),
            (None, false) => None,
            (Some(p), true) => Some(p.saturating_sub(1)),
            (Some(p), false) if p < last => Some(p + 1),
            (Some(_), false) => None,
        };
        self.history_pos = pos;
        self.command = pos.map(|p| self.history[p].clone()).unwrap_or_default();
    }

    /// Handle one key press
    pub fn handle_key(&mut self, ctx: &KeybindingContext, key: KeyEvent) -> Option<UiAction> {
        if self.help_visible {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.help_visible = false;
            }
            return None;
        }

        let action = ctx.action_for(&self.mode, &key);
        match self.mode {
            AppMode::VariableList => self.handle_list_key(action),
            AppMode::ValuePicker => self.handle_picker_key(action, key),
            AppMode::CommandInput => self.handle_command_key(action, key),
        }
    }

    fn handle_list_key(&mut self, action: Option<KeyAction>) -> Option<UiAction> {
        match action? {
            KeyAction::Quit => return Some(UiAction::Quit),
            KeyAction::Help => self.help_visible = true,
            KeyAction::NavigateUp => self.select_previous(),
            KeyAction::NavigateDown => self.select_next(),
            KeyAction::Select => self.open_selected(),
            KeyAction::Command => self.open_command(String::new()),
            KeyAction::Sweep => {
                let info = self.selected_variable()?;
                if info.domain.is_continuous() {
                    let prefill = format!("sweep {} ", info.name);
                    self.open_command(prefill);
                } else {
                    self.status_message = format!("{} cannot be swept ({})", info.name, info.domain);
                }
            }
            KeyAction::CancelSweep => {
                let name = &self.selected_variable()?.name;
                return Some(UiAction::Execute(format!("cancel {}", name)));
            }
            _ => {}
        }
        None
    }

    fn handle_picker_key(&mut self, action: Option<KeyAction>, key: KeyEvent) -> Option<UiAction> {
        let picker = self.picker.as_mut()?;

        if let KeyCode::Char(c) = key.code {
            if (c.is_ascii_digit() || c == '.') && !key.modifiers.contains(KeyModifiers::CONTROL) {
                picker.duration.push(c);
                return None;
            }
        }

        match action? {
            KeyAction::NavigateUp => {
                let n = picker.options.len().max(1);
                picker.selected = (picker.selected + n - 1) % n;
            }
            KeyAction::NavigateDown => {
                picker.selected = (picker.selected + 1) % picker.options.len().max(1);
            }
            KeyAction::EditText => {
                picker.duration.pop();
            }
            KeyAction::Confirm => {
                let command = picker.command();
                self.close_picker();
                return Some(UiAction::Execute(command));
            }
            KeyAction::Cancel => self.close_picker(),
            KeyAction::Help => self.help_visible = true,
            KeyAction::Quit => return Some(UiAction::Quit),
            _ => {}
        }
        None
    }

    fn handle_command_key(&mut self, action: Option<KeyAction>, key: KeyEvent) -> Option<UiAction> {
        match action {
            Some(KeyAction::Quit) => return Some(UiAction::Quit),
            Some(KeyAction::Confirm) => {
                let line = std::mem::take(&mut self.command);
                self.mode = AppMode::VariableList;
                let line = line.trim().to_string();
                if line.is_empty() {
                    return None;
                }
                if self.history.last() != Some(&line) {
                    if self.history.len() == MAX_HISTORY_ENTRIES {
                        self.history.remove(0);
                    }
                    self.history.push(line.clone());
                }
                return Some(UiAction::Execute(line));
            }
            Some(KeyAction::Cancel) => {
                self.command.clear();
                self.mode = AppMode::VariableList;
            }
            Some(KeyAction::EditText) => {
                self.command.pop();
            }
            Some(KeyAction::NavigateUp) => self.recall(true),
            Some(KeyAction::NavigateDown) => self.recall(false),
            Some(_) => {}
            None => {
                if let KeyCode::Char(c) = key.code {
                    if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                        self.command.push(c);
                    }
                }
            }
        }
        None
    }
}
