//! User interface rendering module
//!
//! Layout, top to bottom: title, variable table, change log, command bar,
//! navigation bar. The value picker and help overlay draw on top.

use crate::app::{AppMode, AppState, LogKind, PickerState};
use crate::components::help_overlay::HelpOverlay;
use crate::components::keybindings::KeybindingContext;
use crate::theme::{Colors, Styles, Theme, UiConstants};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState},
};

/// UI renderer for the application
#[derive(Debug, Default)]
pub struct UiRenderer;

impl UiRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the complete UI based on application state
    pub fn render(&self, f: &mut Frame, state: &AppState, keybinding_ctx: &KeybindingContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(UiConstants::TITLE_HEIGHT),
                Constraint::Min(4),
                Constraint::Length(UiConstants::LOG_HEIGHT),
                Constraint::Length(UiConstants::COMMAND_BAR_HEIGHT),
                Constraint::Length(UiConstants::NAV_BAR_HEIGHT),
            ])
            .split(f.area());

        render_title(f, chunks[0]);
        render_variables(f, state, chunks[1]);
        render_log(f, state, chunks[2]);
        render_command_bar(f, state, chunks[3]);
        render_nav_bar(f, state, keybinding_ctx, chunks[4]);

        if let (AppMode::ValuePicker, Some(picker)) = (state.mode, state.picker.as_ref()) {
            render_picker(f, picker);
        }

        if state.help_visible {
            HelpOverlay::new(&state.mode, keybinding_ctx).render(f, f.area());
        }
    }
}

fn render_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new("CNC Machine Simulator")
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .style(Styles::title());
    f.render_widget(title, area);
}

fn render_variables(f: &mut Frame, state: &AppState, area: Rect) {
    let header = Row::new(["Variable", "Value", "Domain", "Activity"]).style(Styles::header());

    let rows: Vec<Row> = state
        .variables
        .iter()
        .map(|v| {
            Row::new(vec![
                Cell::from(v.name.clone()),
                Cell::from(v.value.to_string()).style(Styles::text()),
                Cell::from(v.domain.to_string()).style(Styles::text_secondary()),
                Cell::from(v.activity.to_string()).style(Theme::activity_style(&v.activity)),
            ])
        })
        .collect();

    let focused = state.mode == AppMode::VariableList;
    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Percentage(45),
            Constraint::Min(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" Variables ")
            .borders(Borders::ALL)
            .border_style(if focused {
                Styles::border_active()
            } else {
                Styles::border_inactive()
            }),
    )
    .row_highlight_style(Styles::selected())
    .highlight_symbol("▶ ");

    let mut table_state = TableState::default().with_selected(Some(state.selected));
    f.render_stateful_widget(table, area, &mut table_state);
}

fn render_log(f: &mut Frame, state: &AppState, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = state.log.len().saturating_sub(visible);
    let items: Vec<ListItem> = state
        .log
        .iter()
        .skip(skip)
        .map(|entry| {
            let style = match entry.kind {
                LogKind::Change(origin) => Theme::origin_style(origin),
                LogKind::Reply => Theme::reply_style(&entry.text),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>8.2}s  ", entry.elapsed), Styles::text_muted()),
                Span::styled(entry.text.clone(), style),
            ]))
        })
        .collect();

    let log = List::new(items).block(
        Block::default()
            .title(" Changes ")
            .borders(Borders::ALL)
            .border_style(Styles::border_inactive()),
    );
    f.render_widget(log, area);
}

fn render_command_bar(f: &mut Frame, state: &AppState, area: Rect) {
    let (text, style, border) = if state.mode == AppMode::CommandInput {
        (
            format!("> {}█", state.command),
            Styles::text(),
            Styles::border_active(),
        )
    } else {
        (
            state.status_message.clone(),
            Theme::reply_style(&state.status_message),
            Styles::border_inactive(),
        )
    };
    let bar = Paragraph::new(text).style(style).block(
        Block::default()
            .title(" Command ")
            .borders(Borders::ALL)
            .border_style(border),
    );
    f.render_widget(bar, area);
}

fn render_nav_bar(f: &mut Frame, state: &AppState, keybinding_ctx: &KeybindingContext, area: Rect) {
    let mut spans = Vec::new();
    for item in keybinding_ctx.get_nav_items(&state.mode) {
        spans.push(Span::styled(format!(" {} ", item.key_display), Styles::nav_key()));
        spans.push(Span::styled(format!("{}  ", item.action_label), Styles::nav_hint()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_picker(f: &mut Frame, picker: &PickerState) {
    let area = f.area();
    let width = (area.width * UiConstants::POPUP_WIDTH_PCT / 100)
        .clamp(24, UiConstants::POPUP_MAX_WIDTH)
        .min(area.width);
    let height = (picker.options.len() as u16 + 5).min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .margin(1)
        .split(popup);

    let items: Vec<ListItem> = picker
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let style = if i == picker.selected {
                Styles::selected()
            } else {
                Styles::text()
            };
            ListItem::new(Line::from(Span::styled(format!(" {} ", option), style)))
        })
        .collect();

    let hold = if picker.duration.is_empty() {
        Span::styled("permanent", Styles::text_muted())
    } else {
        Span::styled(format!("{} s", picker.duration), Style::default().fg(Colors::SECONDARY))
    };

    f.render_widget(Clear, popup);
    f.render_widget(
        Block::default()
            .title(format!(" Set {} ", picker.variable))
            .borders(Borders::ALL)
            .border_style(Styles::border_active())
            .style(Styles::panel_bg()),
        popup,
    );
    f.render_widget(List::new(items), chunks[0]);
    f.render_widget(
        Paragraph::new(Line::from(vec![Span::styled("Hold: ", Styles::text_secondary()), hold])),
        chunks[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::engine::Engine;
    use ratatui::{Terminal, backend::TestBackend};

    fn draw(state: &AppState) -> String {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| UiRenderer::new().render(f, state, &KeybindingContext::new()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_variable_table() {
        let engine = Engine::new(&SimConfig::default()).unwrap();
        let mut state = AppState::new();
        state.update_variables(engine.list_variables().unwrap());

        let screen = draw(&state);
        assert!(screen.contains("CNC Machine Simulator"));
        assert!(screen.contains("spindle"));
        assert!(screen.contains("STOPPED"));
        assert!(screen.contains("Sweep"));
    }

    #[test]
    fn test_renders_picker_and_help() {
        let mut state = AppState::new();
        state.mode = AppMode::ValuePicker;
        state.picker = Some(PickerState {
            variable: "Recipe".to_string(),
            options: vec!["Gear".to_string(), "Shaft".to_string(), "Bolt".to_string()],
            selected: 1,
            duration: "5".to_string(),
        });
        let screen = draw(&state);
        assert!(screen.contains("Set Recipe"));
        assert!(screen.contains("Shaft"));
        assert!(screen.contains("5 s"));

        state.help_visible = true;
        let screen = draw(&state);
        assert!(screen.contains("CNC Simulator Help"));
    }
}
