//! TUI view state: selection, edit prompt and the last error.
//!
//! The panel owns every value; the view only remembers which control is
//! selected and what is being typed.

use std::time::Instant;

use anyhow::Result;

use super::actions::PanelAction;
use super::input::InputMode;
use crate::binder::ControlKind;
use crate::panel::Panel;
use crate::param::ParamValue;

/// An in-progress text edit of one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPrompt {
    /// Address of the control being edited.
    pub address: String,
    /// Display name shown in the prompt.
    pub label: String,
    /// Text typed so far.
    pub buffer: String,
}

/// Presentation state of the TUI.
#[derive(Debug, Default)]
pub struct ViewState {
    /// Index into [`ControlSet::controls`](crate::binder::ControlSet::controls).
    selected: usize,
    editing: Option<EditPrompt>,
    message: Option<String>,
}

impl ViewState {
    /// Fresh view with the first control selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the selected control.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// The open edit prompt, if any.
    #[must_use]
    pub fn editing(&self) -> Option<&EditPrompt> {
        self.editing.as_ref()
    }

    /// The last rejected edit, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Input mode implied by the panel and the prompt.
    #[must_use]
    pub fn mode(&self, panel: &Panel) -> InputMode {
        if !panel.is_visible() {
            InputMode::Hidden
        } else if self.editing.is_some() {
            InputMode::Edit
        } else {
            InputMode::Browse
        }
    }

    /// Apply `action`. Returns `false` when the TUI should exit.
    pub fn apply(&mut self, panel: &mut Panel, action: PanelAction, now: Instant) -> bool {
        match action {
            PanelAction::Quit => return false,
            PanelAction::Up => self.step(panel, -1),
            PanelAction::Down => self.step(panel, 1),
            PanelAction::Top => {
                if let Some(first) = panel.controls().visible_rows().first() {
                    self.selected = *first;
                }
            }
            PanelAction::Bottom => {
                if let Some(last) = panel.controls().visible_rows().last() {
                    self.selected = *last;
                }
            }
            PanelAction::Activate => self.activate(panel, now),
            PanelAction::Nudge(steps) => self.nudge(panel, steps, now),
            PanelAction::ToggleHidden => {
                self.editing = None;
                panel.toggle_visibility();
            }
            PanelAction::InputChar(c) => {
                if let Some(prompt) = self.editing.as_mut() {
                    prompt.buffer.push(c);
                }
            }
            PanelAction::InputBackspace => {
                if let Some(prompt) = self.editing.as_mut() {
                    prompt.buffer.pop();
                }
            }
            PanelAction::InputSubmit => {
                if let Some(prompt) = self.editing.take() {
                    let result = panel.edit(&prompt.address, ParamValue::Text(prompt.buffer), now);
                    self.report(result);
                }
            }
            PanelAction::InputCancel => self.editing = None,
        }
        true
    }

    /// Move the selection `delta` rows through the visible controls.
    fn step(&mut self, panel: &Panel, delta: isize) {
        let rows = panel.controls().visible_rows();
        if rows.is_empty() {
            return;
        }
        let current = rows.iter().position(|row| *row == self.selected).unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(rows.len() - 1);
        self.selected = rows[next];
    }

    fn activate(&mut self, panel: &mut Panel, now: Instant) {
        let Some(control) = panel.controls().at(self.selected).cloned() else {
            return;
        };
        match control.kind {
            ControlKind::Group => {
                panel.controls_mut().toggle_group(&control.address);
            }
            ControlKind::Toggle => {
                let on = panel
                    .value(&control.address)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                let result = panel.edit(&control.address, ParamValue::Bool(!on), now);
                self.report(result);
            }
            ControlKind::Trigger => {
                let result = panel.press(&control.address, now);
                self.report(result);
            }
            ControlKind::Slider { .. } | ControlKind::ColorPicker | ControlKind::TextField => {
                let buffer = panel
                    .value(&control.address)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                self.editing = Some(EditPrompt {
                    address: control.address,
                    label: control.label,
                    buffer,
                });
            }
            ControlKind::Display => {}
        }
    }

    fn nudge(&mut self, panel: &mut Panel, steps: i32, now: Instant) {
        let Some(control) = panel.controls().at(self.selected) else {
            return;
        };
        let address = control.address.clone();
        let current = panel.value(&address).and_then(|v| v.as_number());
        if let Some(next) = current.and_then(|n| control.nudged(n, steps)) {
            let result = panel.edit(&address, ParamValue::Number(next), now);
            self.report(result);
        }
    }

    fn report<T>(&mut self, result: Result<T>) {
        self.message = match result {
            Ok(_) => None,
            Err(e) => {
                log::debug!("[tui] {e:#}");
                Some(format!("{e:#}"))
            }
        };
    }
}
