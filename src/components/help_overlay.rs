//! Help overlay component
//!
//! Displays context-sensitive key help plus the command grammar in a
//! centered popup.

use super::keybindings::{HelpSection, KeybindingContext};
use crate::app::AppMode;
use crate::control::help_lines;
use crate::theme::{Colors, Styles};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Help overlay component
pub struct HelpOverlay {
    content: Vec<Line<'static>>,
}

impl HelpOverlay {
    /// Create a new help overlay for the given mode
    pub fn new(mode: &AppMode, keybinding_ctx: &KeybindingContext) -> Self {
        let sections = keybinding_ctx.get_help_content(mode);
        Self {
            content: Self::build_content(&sections, mode),
        }
    }

    fn build_content(sections: &[HelpSection], mode: &AppMode) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();

        lines.push(Line::from(vec![Span::styled(
            "  CNC Simulator Help  ",
            Styles::title(),
        )]));
        lines.push(Line::from(""));

        let mode_name = match mode {
            AppMode::VariableList => "Variables",
            AppMode::ValuePicker => "Value Picker",
            AppMode::CommandInput => "Command Line",
        };
        lines.push(Line::from(vec![
            Span::styled("Current: ", Style::default().fg(Colors::FG_MUTED)),
            Span::styled(mode_name.to_string(), Style::default().fg(Colors::SECONDARY)),
        ]));
        lines.push(Line::from(""));

        for section in sections {
            lines.push(Line::from(vec![Span::styled(
                format!("  {}  ", section.title),
                Style::default()
                    .fg(Colors::SUCCESS)
                    .add_modifier(Modifier::BOLD),
            )]));
            for (key, description) in &section.items {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("{:<10}", key), Styles::nav_key()),
                    Span::styled(description.clone(), Styles::text()),
                ]));
            }
            lines.push(Line::from(""));
        }

        lines.push(Line::from(vec![Span::styled(
            "  Commands  ",
            Style::default()
                .fg(Colors::SUCCESS)
                .add_modifier(Modifier::BOLD),
        )]));
        for line in help_lines() {
            lines.push(Line::from(Span::styled(
                format!("    {}", line),
                Styles::text_secondary(),
            )));
        }

        lines
    }

    /// Lines the overlay will draw
    pub fn content(&self) -> &[Line<'static>] {
        &self.content
    }

    /// Render the help overlay centered in `parent`
    pub fn render(&self, f: &mut Frame, parent: Rect) {
        let width = parent.width.saturating_sub(4).clamp(20, 90).min(parent.width);
        let height = (self.content.len() as u16 + 2).min(parent.height);
        let area = Rect {
            x: parent.x + (parent.width.saturating_sub(width)) / 2,
            y: parent.y + (parent.height.saturating_sub(height)) / 2,
            width,
            height,
        };

        let popup = Paragraph::new(self.content.clone())
            .block(
                Block::default()
                    .title(" Help ")
                    .title_bottom(Line::from(" Press ? or Esc to close ").style(Styles::nav_hint()))
                    .borders(Borders::ALL)
                    .border_style(Styles::border_active()),
            )
            .style(Styles::panel_bg())
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }
}
