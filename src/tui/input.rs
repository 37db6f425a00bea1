//! Terminal input handling for the TUI.
//!
//! ```text
//! crossterm::Event ──► event_to_action() ──► PanelAction
//!                                                 │
//!                             ViewState::apply() ◄┘
//! ```
//!
//! Bindings:
//!
//! | Key               | Browse                         | Edit prompt |
//! |-------------------|--------------------------------|-------------|
//! | `↑`/`k`, `↓`/`j`  | select                         |             |
//! | `Enter`/`Space`   | toggle, press, expand, edit    | apply       |
//! | `←`/`h`, `→`/`l`  | nudge slider (`Shift` ×10)     |             |
//! | `H`               | hide / show                    |             |
//! | `Esc`             |                                | cancel      |
//! | `q`, `Ctrl+C`     | quit                           |             |

// Rust guideline compliant 2026-02

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::actions::PanelAction;
use crate::constants::COARSE_NUDGE_STEPS;

/// Input mode of the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Moving through controls.
    #[default]
    Browse,
    /// Typing into the edit prompt.
    Edit,
    /// Panel hidden; only show and quit work.
    Hidden,
}

/// Convert a crossterm event to a [`PanelAction`].
///
/// Returns `None` for events with no binding (key releases, mouse, resize).
#[must_use]
pub fn event_to_action(event: &Event, mode: InputMode) -> Option<PanelAction> {
    match event {
        Event::Key(key) => key_event_to_action(key, mode),
        _ => None,
    }
}

/// Convert a key event to a [`PanelAction`].
#[must_use]
pub fn key_event_to_action(key: &KeyEvent, mode: InputMode) -> Option<PanelAction> {
    // Only process key press events
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(PanelAction::Quit);
    }

    match mode {
        InputMode::Browse => browse_key(key),
        InputMode::Edit => edit_key(key),
        InputMode::Hidden => match key.code {
            KeyCode::Char('H') => Some(PanelAction::ToggleHidden),
            KeyCode::Char('q') => Some(PanelAction::Quit),
            _ => None,
        },
    }
}

fn browse_key(key: &KeyEvent) -> Option<PanelAction> {
    let coarse = key.modifiers.contains(KeyModifiers::SHIFT);
    let steps = if coarse { COARSE_NUDGE_STEPS } else { 1 };

    match key.code {
        KeyCode::Char('q') => Some(PanelAction::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(PanelAction::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(PanelAction::Down),
        KeyCode::Home | KeyCode::Char('g') => Some(PanelAction::Top),
        KeyCode::End | KeyCode::Char('G') => Some(PanelAction::Bottom),
        KeyCode::Enter | KeyCode::Char(' ') => Some(PanelAction::Activate),
        KeyCode::Left | KeyCode::Char('h') => Some(PanelAction::Nudge(-steps)),
        KeyCode::Right | KeyCode::Char('l') => Some(PanelAction::Nudge(steps)),
        // Shift+h / Shift+l arrive as uppercase characters.
        KeyCode::Char('L') => Some(PanelAction::Nudge(COARSE_NUDGE_STEPS)),
        KeyCode::Char('H') => Some(PanelAction::ToggleHidden),
        _ => None,
    }
}

fn edit_key(key: &KeyEvent) -> Option<PanelAction> {
    match key.code {
        KeyCode::Esc => Some(PanelAction::InputCancel),
        KeyCode::Enter => Some(PanelAction::InputSubmit),
        KeyCode::Backspace => Some(PanelAction::InputBackspace),
        KeyCode::Char(c) => Some(PanelAction::InputChar(c)),
        _ => None,
    }
}
