//! Application-wide constants for osc-panel.
//!
//! Timing values, storage slot names, and the built-in settings defaults
//! live here so they can be found in one place.
//!
//! # Categories
//!
//! - **Timing**: Reconnect interval, button flash, loop pacing
//! - **Storage**: Persisted slot keys and file names
//! - **Endpoint**: Default WebSocket peer
//! - **UI**: Nudge multipliers

use std::time::Duration;

// ============================================================================
// Timing
// ============================================================================

/// Interval between reconnect attempts while auto-reconnect is armed.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// How long a pressed button stays highlighted in the panel.
pub const BUTTON_FLASH: Duration = Duration::from_millis(100);

/// How long a control stays highlighted after a remote update.
pub const REMOTE_HIGHLIGHT: Duration = Duration::from_millis(400);

/// TUI frame delay (approximately 60fps).
pub const FRAME_RATE_DELAY: Duration = Duration::from_millis(16);

/// Sleep between iterations of the headless loop.
pub const HEADLESS_TICK: Duration = Duration::from_millis(20);

// ============================================================================
// Storage
// ============================================================================

/// Slot holding the user's current settings.
pub const APP_SETTINGS_SLOT: &str = "appSettings";

/// Slot holding the factory-default snapshot written at startup.
pub const FACTORY_DEFAULT_SLOT: &str = "factoryDefault";

/// File name of the key-value store inside the config directory.
pub const STORE_FILE_NAME: &str = "storage.json";

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// File name of the log inside the config directory.
pub const LOG_FILE_NAME: &str = "osc-panel.log";

// ============================================================================
// Endpoint
// ============================================================================

/// Default WebSocket peer host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default WebSocket peer port.
pub const DEFAULT_PORT: u16 = 8080;

/// Lowest port selectable from the panel.
pub const MIN_PORT: u16 = 1024;

// ============================================================================
// UI
// ============================================================================

/// Number of slider steps taken by a shifted nudge.
pub const COARSE_NUDGE_STEPS: i32 = 10;

/// Fraction of the range used as a step by sliders without `step`.
pub const UNSTEPPED_NUDGE_DIVISIONS: f64 = 100.0;
