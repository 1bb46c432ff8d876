//! Centralized theme and styling for the TUI
//!
//! Single source of truth for the colors and styles used by the operator
//! console.
//!
//! # Usage
//! ```rust
//! use cncsim::theme::{Colors, Styles, Theme};
//! use cncsim::engine::ChangeOrigin;
//! use ratatui::style::Style;
//!
//! let style = Style::default().fg(Colors::PRIMARY);
//! let title_style = Styles::title();
//! let revert_style = Theme::origin_style(ChangeOrigin::Revert);
//! ```

use crate::engine::{Activity, ChangeOrigin};
use ratatui::style::{Color, Modifier, Style};

// =============================================================================
// COLOR PALETTE
// =============================================================================

/// Core color palette for the application
pub struct Colors;

impl Colors {
    /// Primary dark background - used for popups
    pub const BG_PRIMARY: Color = Color::Rgb(20, 20, 30);

    /// Default foreground text color
    pub const FG_PRIMARY: Color = Color::White;

    /// Secondary/muted text color
    pub const FG_SECONDARY: Color = Color::Gray;

    /// Disabled/inactive text color
    pub const FG_MUTED: Color = Color::DarkGray;

    /// Primary accent color - used for borders, titles, highlights
    pub const PRIMARY: Color = Color::Cyan;

    /// Secondary accent color - used for selected items, emphasis
    pub const SECONDARY: Color = Color::Yellow;

    pub const SUCCESS: Color = Color::Green;

    pub const ERROR: Color = Color::Red;

    /// Active border color
    pub const BORDER_ACTIVE: Color = Color::Cyan;

    /// Inactive/unfocused border color
    pub const BORDER_INACTIVE: Color = Color::DarkGray;

    /// Selected item highlight
    pub const SELECTED_BG: Color = Color::Yellow;

    /// Selected item text (for contrast on yellow bg)
    pub const SELECTED_FG: Color = Color::Black;

    /// Navigation hint color
    pub const NAV_HINT: Color = Color::DarkGray;

    /// Value written by a running sweep
    pub const SWEEP: Color = Color::Magenta;

    /// Value restored by an expired override
    pub const REVERT: Color = Color::LightBlue;
}

// =============================================================================
// PRE-BUILT STYLES
// =============================================================================

/// Pre-built styles for common UI patterns
pub struct Styles;

impl Styles {
    pub fn text() -> Style {
        Style::default().fg(Colors::FG_PRIMARY)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }

    pub fn text_secondary() -> Style {
        Style::default().fg(Colors::FG_SECONDARY)
    }

    /// Main title style (cyan, bold)
    pub fn title() -> Style {
        Style::default()
            .fg(Colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Column header style
    pub fn header() -> Style {
        Style::default()
            .fg(Colors::SECONDARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_active() -> Style {
        Style::default().fg(Colors::BORDER_ACTIVE)
    }

    pub fn border_inactive() -> Style {
        Style::default().fg(Colors::BORDER_INACTIVE)
    }

    pub fn panel_bg() -> Style {
        Style::default().bg(Colors::BG_PRIMARY)
    }

    /// Selected/highlighted item
    pub fn selected() -> Style {
        Style::default()
            .fg(Colors::SELECTED_FG)
            .bg(Colors::SELECTED_BG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Colors::SUCCESS)
    }

    pub fn error() -> Style {
        Style::default().fg(Colors::ERROR)
    }

    /// Navigation hint (keybindings)
    pub fn nav_hint() -> Style {
        Style::default().fg(Colors::NAV_HINT)
    }

    /// Key label in the navigation bar
    pub fn nav_key() -> Style {
        Style::default()
            .fg(Colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }
}

// =============================================================================
// THEME CONTEXT
// =============================================================================

/// Semantic style lookups
pub struct Theme;

impl Theme {
    /// Style for a change-log entry by who caused it
    pub fn origin_style(origin: ChangeOrigin) -> Style {
        match origin {
            ChangeOrigin::Operator => Style::default().fg(Colors::FG_PRIMARY),
            ChangeOrigin::Revert => Style::default().fg(Colors::REVERT),
            ChangeOrigin::Sweep => Style::default().fg(Colors::SWEEP),
        }
    }

    /// Style for the activity column
    pub fn activity_style(activity: &Activity) -> Style {
        match activity {
            Activity::Idle => Style::default().fg(Colors::FG_MUTED),
            Activity::RevertPending { .. } => Style::default().fg(Colors::REVERT),
            Activity::Sweeping { .. } => Style::default()
                .fg(Colors::SWEEP)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Style for a reply line from the control surface
    pub fn reply_style(line: &str) -> Style {
        if line.starts_with('✗') {
            Styles::error()
        } else if line.starts_with('•') {
            Styles::success()
        } else {
            Styles::text_secondary()
        }
    }
}

// =============================================================================
// UI CONSTANTS
// =============================================================================

/// UI dimension and layout constants
pub struct UiConstants;

impl UiConstants {
    /// Title bar height
    pub const TITLE_HEIGHT: u16 = 3;

    /// Change log panel height (including borders)
    pub const LOG_HEIGHT: u16 = 10;

    /// Command bar height
    pub const COMMAND_BAR_HEIGHT: u16 = 3;

    /// Nav bar height
    pub const NAV_BAR_HEIGHT: u16 = 1;

    /// Popup width percentage
    pub const POPUP_WIDTH_PCT: u16 = 50;

    /// Popup max width
    pub const POPUP_MAX_WIDTH: u16 = 60;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use std::time::Duration;

    #[test]
    fn test_origin_styles_are_distinct() {
        assert_ne!(
            Theme::origin_style(ChangeOrigin::Revert),
            Theme::origin_style(ChangeOrigin::Sweep)
        );
        assert_ne!(
            Theme::origin_style(ChangeOrigin::Operator),
            Theme::origin_style(ChangeOrigin::Revert)
        );
    }

    #[test]
    fn test_activity_styles() {
        let pending = Activity::RevertPending {
            restore: Value::from("OFF"),
            remaining: Duration::from_secs(1),
        };
        assert_eq!(Theme::activity_style(&pending).fg, Some(Colors::REVERT));
        assert_eq!(Theme::activity_style(&Activity::Idle).fg, Some(Colors::FG_MUTED));
    }

    #[test]
    fn test_reply_style() {
        assert_eq!(Theme::reply_style("✗ Unknown variable").fg, Some(Colors::ERROR));
        assert_eq!(Theme::reply_style("• Value for c1").fg, Some(Colors::SUCCESS));
    }
}
