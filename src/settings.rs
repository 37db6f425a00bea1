//! Built-in settings subtree.
//!
//! Every panel carries a `settings` folder with the connection, persistence
//! and visibility controls. Application parameters are merged next to it.

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT, MIN_PORT};
use crate::param::{FolderDef, NodeDef};

/// Name of the top-level settings folder.
pub const ROOT: &str = "settings";

/// Address of the WebSocket host leaf.
pub const ADDRESS: &str = "/settings/websocket/address";
/// Address of the WebSocket port leaf.
pub const PORT: &str = "/settings/websocket/port";
/// Address of the connection status label.
pub const STATUS: &str = "/settings/websocket/status";
/// Address of the debug logging toggle.
pub const DEBUG_LOG: &str = "/settings/websocket/debugLog";
/// Address of the auto-reconnect toggle.
pub const AUTO_RECONNECT: &str = "/settings/websocket/autoReconnect";
/// Address of the connect-at-startup toggle.
pub const AUTO_CONNECT: &str = "/settings/websocket/autoConnect";
/// Address of the hide-at-startup toggle.
pub const AUTO_HIDE: &str = "/settings/gui/autoHide";

/// Action bound to a built-in button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    /// Toggle panel visibility.
    Hide,
    /// Save current settings.
    Save,
    /// Reload saved settings.
    Reload,
    /// Restore factory defaults.
    Reset,
    /// Open the connection.
    Connect,
    /// Close the connection.
    Disconnect,
    /// Send every leaf value to the peer.
    Dump,
}

impl SettingsAction {
    /// The action bound to `address`, if it is a built-in button.
    #[must_use]
    pub fn for_address(address: &str) -> Option<Self> {
        match address {
            "/settings/gui/hide" => Some(Self::Hide),
            "/settings/gui/save" => Some(Self::Save),
            "/settings/gui/reload" => Some(Self::Reload),
            "/settings/gui/reset" => Some(Self::Reset),
            "/settings/websocket/connect" => Some(Self::Connect),
            "/settings/websocket/disconnect" => Some(Self::Disconnect),
            "/settings/websocket/dump" => Some(Self::Dump),
            _ => None,
        }
    }
}

/// Build the settings subtree.
#[must_use]
pub fn definition() -> FolderDef {
    let gui = FolderDef::new()
        .with("hide", NodeDef::button())
        .with("save", NodeDef::button())
        .with("reload", NodeDef::button())
        .with("reset", NodeDef::button())
        .with("autoHide", NodeDef::boolean(false));

    let websocket = FolderDef::new()
        .with("address", NodeDef::string(DEFAULT_HOST))
        .with(
            "port",
            NodeDef::number(f64::from(DEFAULT_PORT))
                .range(f64::from(MIN_PORT), f64::from(u16::MAX))
                .step(1.0),
        )
        .with("connect", NodeDef::button())
        .with("disconnect", NodeDef::button())
        .with("dump", NodeDef::button())
        .with("debugLog", NodeDef::boolean(false))
        .with("autoReconnect", NodeDef::boolean(false))
        .with("status", NodeDef::label("Disconnected").transient())
        .with("autoConnect", NodeDef::boolean(false));

    FolderDef::new().with(
        ROOT,
        NodeDef::folder(
            FolderDef::new()
                .with("gui", NodeDef::folder(gui))
                .with("websocket", NodeDef::folder(websocket)),
        ),
    )
}
