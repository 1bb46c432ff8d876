//! Keybinding system for context-aware keyboard shortcuts
//!
//! Provides a registry of keybindings that change based on the current
//! application mode. The same registry drives key dispatch, the navigation
//! bar and the help overlay, so they cannot drift apart.

use crate::app::AppMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    NavigateUp,
    NavigateDown,
    /// Open the value picker (enumerated) or a prefilled `set` (continuous)
    Select,
    /// Prefill a `sweep` command for the selected variable
    Sweep,
    CancelSweep,
    /// Open an empty command line
    Command,
    Confirm,
    Cancel,
    /// Delete the last typed character
    EditText,
    Help,
    Quit,
}

/// A keybinding definition
#[derive(Debug, Clone)]
pub struct Keybinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: KeyAction,
    pub display: String,
    pub description: String,
}

impl Keybinding {
    /// Create a new keybinding with no modifiers
    pub fn new(key: KeyCode, action: KeyAction, display: &str, description: &str) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
            action,
            display: display.to_string(),
            description: description.to_string(),
        }
    }

    /// Create a keybinding with modifiers
    pub fn with_modifiers(
        key: KeyCode,
        modifiers: KeyModifiers,
        action: KeyAction,
        display: &str,
        description: &str,
    ) -> Self {
        Self {
            key,
            modifiers,
            action,
            display: display.to_string(),
            description: description.to_string(),
        }
    }

    /// Whether a key event triggers this binding. Shift is ignored so that
    /// `Q` and `q` behave alike.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let pressed = event.modifiers.difference(KeyModifiers::SHIFT);
        let key_matches = match (self.key, event.code) {
            (KeyCode::Char(a), KeyCode::Char(b)) => a.eq_ignore_ascii_case(&b),
            (a, b) => a == b,
        };
        key_matches && pressed == self.modifiers
    }
}

/// Context-aware keybinding registry
pub struct KeybindingContext {
    /// Mode-specific keybindings
    mode_bindings: HashMap<AppMode, Vec<Keybinding>>,
    /// Global keybindings (available in all modes except text entry)
    global_bindings: Vec<Keybinding>,
}

impl Default for KeybindingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl KeybindingContext {
    /// Create a new keybinding context with default bindings
    pub fn new() -> Self {
        let mut ctx = Self {
            mode_bindings: HashMap::new(),
            global_bindings: Vec::new(),
        };
        ctx.register_defaults();
        ctx
    }

    fn register_defaults(&mut self) {
        let ctrl_c = Keybinding::with_modifiers(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
            KeyAction::Quit,
            "Ctrl+C",
            "Quit",
        );

        self.global_bindings = vec![
            Keybinding::new(KeyCode::Char('?'), KeyAction::Help, "?", "Help"),
            Keybinding::new(KeyCode::Char('q'), KeyAction::Quit, "Q", "Quit"),
            ctrl_c.clone(),
        ];

        self.mode_bindings.insert(
            AppMode::VariableList,
            vec![
                Keybinding::new(KeyCode::Up, KeyAction::NavigateUp, "Up", "Previous variable"),
                Keybinding::new(KeyCode::Down, KeyAction::NavigateDown, "Down", "Next variable"),
                Keybinding::new(KeyCode::Char('k'), KeyAction::NavigateUp, "K", "Previous variable"),
                Keybinding::new(KeyCode::Char('j'), KeyAction::NavigateDown, "J", "Next variable"),
                Keybinding::new(KeyCode::Enter, KeyAction::Select, "Enter", "Set value"),
                Keybinding::new(KeyCode::Char('s'), KeyAction::Sweep, "S", "Sweep"),
                Keybinding::new(KeyCode::Char('x'), KeyAction::CancelSweep, "X", "Cancel sweep"),
                Keybinding::new(KeyCode::Char(':'), KeyAction::Command, ":", "Command"),
            ],
        );

        self.mode_bindings.insert(
            AppMode::ValuePicker,
            vec![
                Keybinding::new(KeyCode::Up, KeyAction::NavigateUp, "Up", "Previous value"),
                Keybinding::new(KeyCode::Down, KeyAction::NavigateDown, "Down", "Next value"),
                Keybinding::new(KeyCode::Backspace, KeyAction::EditText, "0-9 .", "Hold time in seconds (blank = permanent)"),
                Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Apply"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Close"),
            ],
        );

        // Text entry: no single-key globals, every printable key is input
        self.mode_bindings.insert(
            AppMode::CommandInput,
            vec![
                Keybinding::new(KeyCode::Up, KeyAction::NavigateUp, "Up", "Previous command"),
                Keybinding::new(KeyCode::Down, KeyAction::NavigateDown, "Down", "Next command"),
                Keybinding::new(KeyCode::Backspace, KeyAction::EditText, "Bksp", "Delete"),
                Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Run"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Close"),
                ctrl_c,
            ],
        );
    }

    /// Get keybindings for a specific mode (includes global bindings)
    pub fn get_bindings(&self, mode: &AppMode) -> Vec<&Keybinding> {
        let mut bindings: Vec<&Keybinding> = Vec::new();

        if let Some(mode_bindings) = self.mode_bindings.get(mode) {
            bindings.extend(mode_bindings.iter());
        }

        if *mode != AppMode::CommandInput {
            bindings.extend(self.global_bindings.iter());
        }

        bindings
    }

    /// Action bound to `event` in `mode`, if any
    pub fn action_for(&self, mode: &AppMode, event: &KeyEvent) -> Option<KeyAction> {
        self.get_bindings(mode)
            .into_iter()
            .find(|b| b.matches(event))
            .map(|b| b.action)
    }

    /// Get navigation bar items for display
    pub fn get_nav_items(&self, mode: &AppMode) -> Vec<NavBarItem> {
        let bindings = self.get_bindings(mode);

        let priority_actions = match mode {
            AppMode::VariableList => vec![
                KeyAction::NavigateUp,
                KeyAction::Select,
                KeyAction::Sweep,
                KeyAction::CancelSweep,
                KeyAction::Command,
                KeyAction::Help,
                KeyAction::Quit,
            ],
            AppMode::ValuePicker => vec![
                KeyAction::NavigateUp,
                KeyAction::EditText,
                KeyAction::Confirm,
                KeyAction::Cancel,
            ],
            AppMode::CommandInput => vec![
                KeyAction::NavigateUp,
                KeyAction::Confirm,
                KeyAction::Cancel,
            ],
        };

        priority_actions
            .into_iter()
            .filter_map(|action| {
                let binding = bindings.iter().find(|b| b.action == action)?;
                Some(if action == KeyAction::NavigateUp {
                    // Up/Down share one nav bar slot
                    NavBarItem {
                        key_display: "Up/Dn".to_string(),
                        action_label: "Navigate".to_string(),
                    }
                } else {
                    NavBarItem {
                        key_display: binding.display.clone(),
                        action_label: binding.description.clone(),
                    }
                })
            })
            .collect()
    }

    /// Get full help content for a mode (for help overlay)
    pub fn get_help_content(&self, mode: &AppMode) -> Vec<HelpSection> {
        let groups: [(&str, &[KeyAction]); 3] = [
            ("Navigation", &[KeyAction::NavigateUp, KeyAction::NavigateDown]),
            (
                "Actions",
                &[
                    KeyAction::Select,
                    KeyAction::Sweep,
                    KeyAction::CancelSweep,
                    KeyAction::Command,
                    KeyAction::EditText,
                    KeyAction::Confirm,
                    KeyAction::Cancel,
                ],
            ),
            ("General", &[KeyAction::Help, KeyAction::Quit]),
        ];

        let bindings = self.get_bindings(mode);
        groups
            .iter()
            .filter_map(|(title, actions)| {
                let items: Vec<(String, String)> = bindings
                    .iter()
                    .filter(|b| actions.contains(&b.action))
                    .map(|b| (b.display.clone(), b.description.clone()))
                    .collect();
                if items.is_empty() {
                    None
                } else {
                    Some(HelpSection {
                        title: title.to_string(),
                        items,
                    })
                }
            })
            .collect()
    }
}

/// Navigation bar item for display
#[derive(Debug, Clone)]
pub struct NavBarItem {
    pub key_display: String,
    pub action_label: String,
}

/// Help section for the help overlay
#[derive(Debug, Clone)]
pub struct HelpSection {
    pub title: String,
    pub items: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_global_quit_except_in_command_input() {
        let ctx = KeybindingContext::new();
        let q = key(KeyCode::Char('q'));
        assert_eq!(ctx.action_for(&AppMode::VariableList, &q), Some(KeyAction::Quit));
        assert_eq!(ctx.action_for(&AppMode::ValuePicker, &q), Some(KeyAction::Quit));
        assert_eq!(ctx.action_for(&AppMode::CommandInput, &q), None);
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let ctx = KeybindingContext::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in [AppMode::VariableList, AppMode::ValuePicker, AppMode::CommandInput] {
            assert_eq!(ctx.action_for(&mode, &ctrl_c), Some(KeyAction::Quit));
        }
        // Plain 'c' is not Ctrl+C
        assert_eq!(ctx.action_for(&AppMode::VariableList, &key(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_shift_is_ignored_for_letters() {
        let ctx = KeybindingContext::new();
        let shift_s = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);
        assert_eq!(ctx.action_for(&AppMode::VariableList, &shift_s), Some(KeyAction::Sweep));
    }

    #[test]
    fn test_nav_items_collapse_up_down() {
        let ctx = KeybindingContext::new();
        let items = ctx.get_nav_items(&AppMode::VariableList);
        assert_eq!(items[0].key_display, "Up/Dn");
        assert_eq!(items.iter().filter(|i| i.action_label == "Navigate").count(), 1);
        assert!(items.iter().any(|i| i.action_label == "Sweep"));
    }

    #[test]
    fn test_help_content_sections() {
        let ctx = KeybindingContext::new();
        let sections = ctx.get_help_content(&AppMode::VariableList);
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Navigation", "Actions", "General"]);

        let sections = ctx.get_help_content(&AppMode::CommandInput);
        assert!(sections.iter().all(|s| s.title != "General" || s.items.len() == 1));
    }
}
