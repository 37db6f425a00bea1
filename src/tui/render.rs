//! TUI rendering.
//!
//! ```text
//! ┌ osc-panel ─────────────────────┐
//! │ ▸ settings                     │
//! │> sides            5   [3..12]  │
//! │ ▾ look                         │
//! │     [x] filled                 │
//! └────────────────────────────────┘
//!  Connected ws://localhost:8080 | ...
//!  sides: 5_
//! ```

// Rust guideline compliant 2026-02

use std::time::Instant;

use anyhow::Result;
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color as TermColor, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};

use super::view::ViewState;
use crate::binder::{Control, ControlKind};
use crate::bridge::ConnectionStatus;
use crate::panel::Panel;
use crate::param::ParamValue;

const KEY_HELP: &str = "↑↓ select  Enter activate  ←→ adjust  H hide  q quit";

/// Draw one frame of the panel.
///
/// # Errors
///
/// Returns an error if the backend fails to draw.
pub fn render<B>(terminal: &mut Terminal<B>, panel: &Panel, view: &ViewState, now: Instant) -> Result<()>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    terminal.draw(|f| render_frame(f, panel, view, now))?;
    Ok(())
}

fn render_frame(f: &mut Frame, panel: &Panel, view: &ViewState, now: Instant) {
    if !panel.is_visible() {
        let marker = Paragraph::new(" osc-panel hidden (H to show, q to quit) ")
            .style(Style::default().add_modifier(Modifier::DIM));
        f.render_widget(marker, f.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
        .split(f.area());

    render_controls(f, panel, view, now, chunks[0]);
    f.render_widget(Paragraph::new(status_line(panel, now)), chunks[1]);
    f.render_widget(Paragraph::new(prompt_line(view)), chunks[2]);
}

fn render_controls(f: &mut Frame, panel: &Panel, view: &ViewState, now: Instant, area: Rect) {
    let controls = panel.controls();
    let rows = controls.visible_rows();
    let items: Vec<ListItem> = rows
        .iter()
        .filter_map(|index| controls.at(*index))
        .map(|control| ListItem::new(control_line(panel, control, now)))
        .collect();

    let mut state = ListState::default();
    state.select(rows.iter().position(|row| *row == view.selected()));

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" osc-panel "))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut state);
}

fn control_line(panel: &Panel, control: &Control, now: Instant) -> Line<'static> {
    let indent = "  ".repeat(control.depth);
    let label = control.label.clone();
    let value = panel.value(&control.address);

    let mut spans = vec![Span::raw(indent)];
    match control.kind {
        ControlKind::Group => {
            let marker = if control.collapsed { "▸" } else { "▾" };
            spans.push(Span::styled(
                format!("{marker} {label}"),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        ControlKind::Toggle => {
            let on = value.and_then(|v| v.as_bool()).unwrap_or(false);
            spans.push(Span::raw(format!("[{}] {label}", if on { "x" } else { " " })));
        }
        ControlKind::Slider { range } => {
            spans.push(Span::raw(format!("{label}  ")));
            spans.push(Span::styled(
                value.map(|v| v.to_string()).unwrap_or_default(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            if let (Some(min), Some(max)) = (range.min, range.max) {
                spans.push(Span::styled(
                    format!("  [{}..{}]", ParamValue::Number(min), ParamValue::Number(max)),
                    Style::default().add_modifier(Modifier::DIM),
                ));
            }
        }
        ControlKind::ColorPicker => {
            spans.push(Span::raw(format!("{label}  ")));
            if let Some(ParamValue::Color(color)) = value {
                spans.push(Span::styled("██", Style::default().fg(TermColor::Rgb(color.r, color.g, color.b))));
                spans.push(Span::raw(format!(" {color}")));
            }
        }
        ControlKind::TextField => {
            let text = value.map(|v| v.to_string()).unwrap_or_default();
            spans.push(Span::raw(format!("{label}  \"{text}\"")));
        }
        ControlKind::Display => {
            let text = value.map(|v| v.to_string()).unwrap_or_default();
            spans.push(Span::raw(format!("{label}  ")));
            spans.push(Span::styled(text, Style::default().add_modifier(Modifier::DIM)));
        }
        ControlKind::Trigger => {
            let style = if control.is_flashing(now) {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!("[ {label} ]"), style));
        }
    }

    let line = Line::from(spans);
    if control.is_highlighted(now) {
        line.style(Style::default().fg(TermColor::Yellow))
    } else {
        line
    }
}

fn status_line(panel: &Panel, now: Instant) -> Line<'static> {
    let status = panel.status();
    let color = match status {
        ConnectionStatus::Connected => TermColor::Green,
        ConnectionStatus::Connecting => TermColor::Yellow,
        ConnectionStatus::Disconnected => TermColor::Red,
    };
    let mut spans = vec![Span::styled(format!(" {status}"), Style::default().fg(color))];
    if let Some(url) = panel.url() {
        spans.push(Span::raw(format!(" {url}")));
    }
    if let Some(due) = panel.reconnect_due_in(now) {
        spans.push(Span::raw(format!(" (retry in {:.1}s)", due.as_secs_f32())));
    }
    spans.push(Span::styled(
        format!(" | {KEY_HELP}"),
        Style::default().add_modifier(Modifier::DIM),
    ));
    Line::from(spans)
}

fn prompt_line(view: &ViewState) -> Line<'static> {
    if let Some(prompt) = view.editing() {
        return Line::from(vec![
            Span::styled(format!(" {}: ", prompt.label), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{}_", prompt.buffer)),
            Span::styled("  (Enter apply, Esc cancel)", Style::default().add_modifier(Modifier::DIM)),
        ]);
    }
    match view.message() {
        Some(message) => Line::from(Span::styled(format!(" {message}"), Style::default().fg(TermColor::Red))),
        None => Line::default(),
    }
}
