//! TUI actions.
//!
//! Key presses are first turned into a [`PanelAction`], then applied to the
//! panel and view state by [`ViewState::apply`](super::view::ViewState::apply).

/// Something the user asked the TUI to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    /// Leave the TUI.
    Quit,

    // === Navigation ===
    /// Select the previous visible control.
    Up,
    /// Select the next visible control.
    Down,
    /// Select the first visible control.
    Top,
    /// Select the last visible control.
    Bottom,

    // === Controls ===
    /// Toggle, press, expand or start editing the selected control.
    Activate,
    /// Move the selected slider by this many steps.
    Nudge(i32),
    /// Hide or show the panel.
    ToggleHidden,

    // === Edit prompt ===
    /// Append a character.
    InputChar(char),
    /// Delete the last character.
    InputBackspace,
    /// Apply the typed value.
    InputSubmit,
    /// Leave the prompt without applying.
    InputCancel,
}
