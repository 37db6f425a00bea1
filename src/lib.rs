//! osc-panel - a terminal control panel mirrored over OSC/WebSocket.
//!
//! An application declares a tree of typed parameters. The panel shows one
//! control per parameter, keeps values inside their bounds, persists them
//! between runs, and syncs every change with a peer over a WebSocket that
//! carries OSC packets.
//!
//! # Architecture
//!
//! ```text
//!   keys ──► tui ──┐                     ┌──► persist (store slots)
//!                  ├──► Panel ──change──►├──► bridge ──► ws thread ──► peer
//!   peer ──► ws thread ──► events ──┘    └──► observers
//! ```
//!
//! - **Panel** - single owner of the tree, controls, bridge and store
//! - **Bridge** - one WebSocket connection at a time, OSC encode/decode
//! - **TUI** - optional; headless mode drives the same panel
//!
//! # Modules
//!
//! - [`param`] - Parameter tree, values and observers
//! - [`settings`] - Built-in settings subtree
//! - [`binder`] - Controls bound to tree nodes
//! - [`panel`] - Change path, reactions, startup sequence
//! - [`osc`] - OSC messages, binary codec and JSON frames
//! - [`bridge`] - Connection lifecycle and echo guard
//! - [`supervisor`] - Reconnect timer
//! - [`persist`] - Key-value store and snapshot slots
//! - [`config`] - Configuration loading/saving

pub mod binder;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod constants;
pub mod events;
pub mod osc;
pub mod panel;
pub mod param;
pub mod persist;
pub mod run;
pub mod settings;
pub mod supervisor;
pub mod tui;
pub mod ws;

// Re-export commonly used types
pub use bridge::{Bridge, ConnectionStatus, WsConnector};
pub use config::Config;
pub use events::PanelEvent;
pub use osc::{OscArg, OscMessage};
pub use panel::{Origin, Panel, PanelOptions};
pub use param::{FolderDef, NodeDef, ParamTree, ParamValue};
pub use persist::{FileStore, KeyValueStore, MemoryStore};
