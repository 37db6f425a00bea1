//! CLI subcommand implementations that don't involve the interactive panel.
//!
//! - [`send`] - One-shot OSC message to a peer
//! - [`store`] - Inspect and clear saved settings
//!
//! ```ignore
//! use osc_panel::commands;
//!
//! commands::send::run("ws://localhost:8080", "/sides", "6", false)?;
//! commands::store::show(&store, &mut std::io::stdout())?;
//! ```

pub mod send;
pub mod store;
