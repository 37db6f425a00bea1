//! TUI - the terminal control panel.
//!
//! Presents every bound control as a row, lets the user edit values with
//! the keyboard, and shows the connection status.
//!
//! # Modules
//!
//! - [`actions`] - TUI action types (`PanelAction`)
//! - [`guard`] - Terminal state RAII guard for cleanup
//! - [`input`] - Key to action mapping
//! - [`render`] - Frame rendering
//! - [`runner`] - `TuiRunner` event loop and `run_tui()`
//! - [`view`] - Selection and edit prompt state

// Rust guideline compliant 2026-02

pub mod actions;
pub mod guard;
pub mod input;
pub mod render;
pub mod runner;
pub mod view;

use std::io::stdout;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{enable_raw_mode, EnterAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

#[doc(inline)]
pub use actions::PanelAction;
#[doc(inline)]
pub use guard::TerminalGuard;
#[doc(inline)]
pub use runner::TuiRunner;
#[doc(inline)]
pub use view::ViewState;

use crate::events::PanelEvent;
use crate::panel::Panel;

/// Take over the terminal and run the interactive panel until quit.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or drawn to.
pub fn run_tui(
    panel: Panel,
    events: mpsc::UnboundedReceiver<PanelEvent>,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    enable_raw_mode()?;
    let _guard = TerminalGuard::new();
    execute!(stdout(), EnterAlternateScreen)?;

    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut runner = TuiRunner::new(terminal, panel, events, shutdown);
    runner.run()
}

/// An unstarted panel with a small application tree and no network.
#[cfg(test)]
pub(crate) fn test_panel() -> Panel {
    use crate::bridge::{Connector, Outgoing};
    use crate::events::ConnectionId;
    use crate::panel::PanelOptions;
    use crate::param::{Color, FolderDef, NodeDef};
    use crate::persist::MemoryStore;

    struct Offline;

    impl Connector for Offline {
        fn open(
            &mut self,
            url: &str,
            _id: ConnectionId,
            _events: mpsc::UnboundedSender<PanelEvent>,
        ) -> Result<mpsc::UnboundedSender<Outgoing>> {
            anyhow::bail!("offline: {url}")
        }
    }

    let app = FolderDef::new()
        .with("sides", NodeDef::number(5.0).range(3.0, 12.0).step(1.0))
        .with(
            "look",
            NodeDef::folder(
                FolderDef::new()
                    .with("filled", NodeDef::boolean(true))
                    .with("tint", NodeDef::color(Color::from_packed(0xff8800)))
                    .with("title", NodeDef::string("hex")),
            ),
        )
        .with("go", NodeDef::button())
        .with("fps", NodeDef::label("60"));
    let (events, _rx) = mpsc::unbounded_channel();
    Panel::new(
        app,
        Box::new(Offline),
        Box::new(MemoryStore::new()),
        events,
        PanelOptions::default(),
    )
    .unwrap()
}
