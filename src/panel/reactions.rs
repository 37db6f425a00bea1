//! Built-in settings reactions, connection control and persistence.

use std::time::Instant;

use serde_json::Value;

use super::{Origin, Panel};
use crate::bridge::{self, ConnectionStatus};
use crate::constants::{APP_SETTINGS_SLOT, FACTORY_DEFAULT_SLOT};
use crate::param::ParamValue;
use crate::persist;
use crate::settings::{self, SettingsAction};

impl Panel {
    /// React to a settings leaf changing.
    pub(super) fn react(&mut self, address: &str, value: &ParamValue, origin: Origin, now: Instant) {
        match address {
            settings::ADDRESS | settings::PORT => {
                // A restore may touch both leaves; it follows the endpoint once at the end.
                if origin != Origin::Restore {
                    self.follow_endpoint(now);
                }
            }
            settings::DEBUG_LOG => self.set_debug_log(value.as_bool().unwrap_or(false)),
            settings::AUTO_RECONNECT => {
                if value.as_bool().unwrap_or(false) {
                    if self.bridge.status() == ConnectionStatus::Disconnected {
                        self.supervisor.start(now);
                    }
                } else {
                    self.supervisor.stop();
                }
            }
            _ => {}
        }
    }

    pub(super) fn run_action(&mut self, action: SettingsAction, now: Instant) {
        match action {
            SettingsAction::Hide => self.toggle_visibility(),
            SettingsAction::Save => self.save(),
            SettingsAction::Reload => self.reload(now),
            SettingsAction::Reset => self.reset(now),
            SettingsAction::Connect => self.connect(now),
            SettingsAction::Disconnect => self.disconnect(),
            SettingsAction::Dump => {
                self.dump();
            }
        }
    }

    /// Reconnect if connected and the settings now name another endpoint.
    fn follow_endpoint(&mut self, now: Instant) {
        if self.bridge.status() != ConnectionStatus::Connected {
            return;
        }
        let target = bridge::endpoint(&self.tree);
        if target.as_deref() != self.bridge.url() {
            log::info!("[panel] Endpoint changed, reconnecting");
            self.connect(now);
        }
    }

    fn set_debug_log(&mut self, enabled: bool) {
        self.debug_log = enabled;
        if self.drive_log_level {
            log::set_max_level(if enabled {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            });
        }
        log::info!("[panel] Debug logging {}", if enabled { "enabled" } else { "disabled" });
    }

    // ---------------------------------------------------------------------
    // Connection
    // ---------------------------------------------------------------------

    /// Connect to the endpoint in the settings, closing any current
    /// connection first.
    pub fn connect(&mut self, now: Instant) {
        self.bridge.connect(&self.tree);
        self.sync_status();
        if self.bridge.status() == ConnectionStatus::Disconnected && self.flag(settings::AUTO_RECONNECT) {
            self.supervisor.start(now);
        }
    }

    /// Close the connection and stop the reconnect timer.
    pub fn disconnect(&mut self) {
        self.bridge.disconnect();
        self.supervisor.stop();
        self.sync_status();
    }

    /// Send every value leaf to the peer in tree order.
    ///
    /// Returns how many messages were queued (zero while disconnected).
    pub fn dump(&mut self) -> usize {
        let leaves: Vec<(String, ParamValue)> = self
            .tree
            .leaves()
            .filter_map(|node| node.value().map(|v| (node.address().to_string(), v)))
            .collect();
        let sent = leaves
            .iter()
            .filter(|(address, value)| self.bridge.send(address, value))
            .count();
        log::info!("[panel] Dumped {sent} of {} parameters", leaves.len());
        sent
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Save the persisted leaves to the `appSettings` slot.
    pub fn save(&mut self) {
        if self.write_slot(APP_SETTINGS_SLOT) {
            log::info!("[panel] Settings saved");
        }
    }

    /// Apply the `appSettings` slot. A missing slot is a logged no-op.
    pub fn reload(&mut self, now: Instant) {
        match self.read_slot(APP_SETTINGS_SLOT) {
            Some(snapshot) => {
                let count = self.restore(&snapshot, now);
                log::info!("[panel] Settings reloaded ({count} values)");
            }
            None => log::info!("[panel] No saved settings to reload"),
        }
    }

    /// Apply the `factoryDefault` slot. A missing slot is a logged no-op.
    pub fn reset(&mut self, now: Instant) {
        match self.read_slot(FACTORY_DEFAULT_SLOT) {
            Some(snapshot) => {
                let count = self.restore(&snapshot, now);
                log::info!("[panel] Settings reset to factory defaults ({count} values)");
            }
            None => log::info!("[panel] No factory defaults found, nothing reset"),
        }
    }

    /// Whether the `appSettings` slot exists.
    pub(super) fn has_saved_settings(&self) -> bool {
        match self.store.get(APP_SETTINGS_SLOT) {
            Ok(slot) => slot.is_some(),
            Err(e) => {
                log::warn!("[persist] Cannot read store: {e:#}");
                false
            }
        }
    }

    pub(super) fn write_slot(&mut self, slot: &str) -> bool {
        match persist::write_slot(self.store.as_mut(), slot, &self.tree) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[persist] {e:#}");
                false
            }
        }
    }

    fn read_slot(&self, slot: &str) -> Option<Value> {
        persist::read_slot(self.store.as_ref(), slot).unwrap_or_else(|e| {
            log::warn!("[persist] {e:#}");
            None
        })
    }

    /// Apply a snapshot onto the live tree and run the change path for
    /// every leaf written. Returns how many leaves were written.
    fn restore(&mut self, snapshot: &Value, now: Instant) -> usize {
        let applied = self.tree.apply_snapshot(snapshot);
        for (id, stored) in &applied {
            self.propagate(*id, stored, Origin::Restore, now);
        }
        self.follow_endpoint(now);
        applied.len()
    }
}
