//! The panel: one parameter tree kept in sync with controls, peer and store.
//!
//! [`Panel`] is the single owner of every piece of state: the tree, the
//! bound controls, the observer table, the bridge, the reconnect timer and
//! the store. Both event loops (TUI and headless) drive it the same way:
//! user input calls [`Panel::edit`] / [`Panel::press`], connection events go
//! through [`Panel::handle_event`], and [`Panel::tick`] runs the timer.
//!
//! # Change path
//!
//! Every value change, whatever its origin, runs the same steps in order:
//!
//! 1. store the constrained value in the tree
//! 2. send it to the peer (skipped for [`Origin::Remote`] and labels)
//! 3. run the built-in settings reaction for the address, if any
//! 4. notify the address's observers with the stored value
//!
//! Buttons skip steps 1 and 2, and notify observers with the whole tree.

// Rust guideline compliant 2026-02

mod reactions;

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;

use crate::binder::ControlSet;
use crate::bridge::{Bridge, ConnectionStatus, Connector, LinkUpdate};
use crate::constants::{BUTTON_FLASH, RECONNECT_INTERVAL, REMOTE_HIGHLIGHT};
use crate::events::PanelEvent;
use crate::osc::OscMessage;
use crate::param::observer::{OnTrigger, OnValue};
use crate::param::{FolderDef, NodeId, Observer, ObserverTable, ParamTree, ParamValue, Tag};
use crate::persist::KeyValueStore;
use crate::settings;
use crate::supervisor::ReconnectSupervisor;

/// Where a value change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A control edit or application code.
    Local,
    /// A message from the peer. Never sent back.
    Remote,
    /// A snapshot being reloaded or reset.
    Restore,
}

/// Tunables of a panel.
#[derive(Debug, Clone)]
pub struct PanelOptions {
    /// Interval of the reconnect timer.
    pub reconnect_interval: Duration,
    /// Echo suppression window; zero disables it.
    pub echo_window: Duration,
    /// Whether the `debugLog` toggle drives `log::max_level`.
    pub drive_log_level: bool,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            reconnect_interval: RECONNECT_INTERVAL,
            echo_window: Duration::ZERO,
            drive_log_level: false,
        }
    }
}

/// The control panel context.
pub struct Panel {
    tree: ParamTree,
    controls: ControlSet,
    observers: ObserverTable,
    bridge: Bridge,
    supervisor: ReconnectSupervisor,
    store: Box<dyn KeyValueStore>,
    visible: bool,
    debug_log: bool,
    drive_log_level: bool,
}

impl fmt::Debug for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("nodes", &self.tree.len())
            .field("controls", &self.controls.len())
            .field("observers", &self.observers)
            .field("bridge", &self.bridge)
            .field("supervisor", &self.supervisor)
            .field("visible", &self.visible)
            .field("debug_log", &self.debug_log)
            .finish_non_exhaustive()
    }
}

impl Panel {
    /// Build a panel from application definitions.
    ///
    /// The built-in `settings` subtree is merged first; an application
    /// entry with the same top-level name replaces it. Nothing is loaded,
    /// saved or connected until [`Panel::start`].
    ///
    /// # Errors
    ///
    /// Returns an error if the merged definitions do not form a valid tree.
    pub fn new(
        app: FolderDef,
        connector: Box<dyn Connector>,
        store: Box<dyn KeyValueStore>,
        events: mpsc::UnboundedSender<PanelEvent>,
        options: PanelOptions,
    ) -> Result<Self> {
        let def = settings::definition().merged(app);
        let tree = ParamTree::build(&def).context("invalid parameter definitions")?;
        let controls = ControlSet::bind(&tree);
        log::info!(
            "[panel] Built {} parameters ({} controls)",
            tree.leaves().count(),
            controls.len()
        );

        Ok(Self {
            tree,
            controls,
            observers: ObserverTable::new(),
            bridge: Bridge::new(connector, events, options.echo_window),
            supervisor: ReconnectSupervisor::new(options.reconnect_interval),
            store,
            visible: true,
            debug_log: false,
            drive_log_level: options.drive_log_level,
        })
    }

    /// Run the startup sequence.
    ///
    /// Writes the factory-default slot from the freshly built tree, then
    /// reloads saved settings if there are any (or saves the current ones
    /// if not), then honours `autoHide` and `autoConnect`.
    pub fn start(&mut self, now: Instant) {
        self.write_slot(crate::constants::FACTORY_DEFAULT_SLOT);
        if self.has_saved_settings() {
            self.reload(now);
        } else {
            log::info!("[panel] No saved settings, saving defaults");
            self.save();
        }

        if self.flag(settings::AUTO_HIDE) {
            self.visible = false;
        }
        if self.flag(settings::AUTO_CONNECT) {
            log::info!("[panel] Auto-connect enabled");
            self.connect(now);
        }
        self.sync_status();
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// The parameter tree.
    #[must_use]
    pub fn tree(&self) -> &ParamTree {
        &self.tree
    }

    /// The bound controls.
    #[must_use]
    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    /// The bound controls, for collapse and expand.
    pub fn controls_mut(&mut self) -> &mut ControlSet {
        &mut self.controls
    }

    /// Current value at `address`.
    #[must_use]
    pub fn value(&self, address: &str) -> Option<ParamValue> {
        self.tree.value(address)
    }

    /// Connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.bridge.status()
    }

    /// URL of the current connection, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.bridge.url()
    }

    /// Whether the reconnect timer is armed.
    #[must_use]
    pub fn is_reconnecting(&self) -> bool {
        self.supervisor.is_armed()
    }

    /// Time until the reconnect timer is due, if armed.
    #[must_use]
    pub fn reconnect_due_in(&self, now: Instant) -> Option<Duration> {
        self.supervisor.remaining(now)
    }

    /// Whether the panel is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether debug logging is on.
    #[must_use]
    pub fn debug_log(&self) -> bool {
        self.debug_log
    }

    /// The store backing save and reload.
    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    fn flag(&self, address: &str) -> bool {
        self.tree
            .value(address)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    // ---------------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------------

    /// Register an observer on `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if no node has that address.
    pub fn observe(&mut self, address: &str, observer: Box<dyn Observer>) -> Result<()> {
        if self.tree.id(address).is_none() {
            bail!("cannot observe unknown address '{address}'");
        }
        self.observers.register(address, observer);
        Ok(())
    }

    /// Call `f` with the new value whenever the leaf at `address` changes.
    ///
    /// # Errors
    ///
    /// Returns an error if no node has that address.
    pub fn on_change<F>(&mut self, address: &str, f: F) -> Result<()>
    where
        F: FnMut(&ParamValue) + 'static,
    {
        self.observe(address, Box::new(OnValue(f)))
    }

    /// Call `f` with the tree whenever the button at `address` is pressed.
    ///
    /// # Errors
    ///
    /// Returns an error if no node has that address.
    pub fn on_press<F>(&mut self, address: &str, f: F) -> Result<()>
    where
        F: FnMut(&ParamTree) + 'static,
    {
        self.observe(address, Box::new(OnTrigger(f)))
    }

    // ---------------------------------------------------------------------
    // Changes
    // ---------------------------------------------------------------------

    /// Change a value from a control or application code.
    ///
    /// Returns the value stored after coercion and range constraint.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown addresses, buttons, folders, and values
    /// that cannot be coerced to the node's type. Nothing changes on error.
    pub fn edit(&mut self, address: &str, value: ParamValue, now: Instant) -> Result<ParamValue> {
        let id = self
            .tree
            .id(address)
            .with_context(|| format!("unknown parameter address '{address}'"))?;
        self.apply(id, value, Origin::Local, now)
    }

    /// Press the button at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if `address` is not a button.
    pub fn press(&mut self, address: &str, now: Instant) -> Result<()> {
        match self.tree.get(address).map(|n| n.tag()) {
            Some(Tag::Button) => {
                self.trigger(address, Origin::Local, now);
                Ok(())
            }
            Some(tag) => bail!("'{address}' is a {tag}, not a button"),
            None => bail!("unknown parameter address '{address}'"),
        }
    }

    fn apply(&mut self, id: NodeId, value: ParamValue, origin: Origin, now: Instant) -> Result<ParamValue> {
        let stored = self.tree.set(id, value)?;
        self.propagate(id, &stored, origin, now);
        Ok(stored)
    }

    /// Steps 2 to 4 of the change path, for a value already in the tree.
    fn propagate(&mut self, id: NodeId, stored: &ParamValue, origin: Origin, now: Instant) {
        let node = self.tree.node(id);
        let address = node.address().to_string();
        if origin != Origin::Remote && node.tag() != Tag::Label {
            self.bridge.send(&address, stored);
        }
        self.react(&address, stored, origin, now);
        self.observers.notify_value(&address, stored);
    }

    fn trigger(&mut self, address: &str, origin: Origin, now: Instant) {
        log::debug!("[panel] Button {address} pressed ({origin:?})");
        self.controls.flash(address, now + BUTTON_FLASH);
        if let Some(action) = settings::SettingsAction::for_address(address) {
            self.run_action(action, now);
        }
        self.observers.notify_trigger(address, &self.tree);
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    /// Handle an event from the panel channel.
    ///
    /// Returns `false` for [`PanelEvent::Shutdown`].
    pub fn handle_event(&mut self, event: PanelEvent, now: Instant) -> bool {
        match event {
            PanelEvent::Link(event) => {
                if let Some(update) = self.bridge.handle(event) {
                    self.link_update(update, now);
                }
                true
            }
            PanelEvent::Shutdown => false,
        }
    }

    fn link_update(&mut self, update: LinkUpdate, now: Instant) {
        match update {
            LinkUpdate::Opened => {
                self.supervisor.stop();
                self.sync_status();
            }
            LinkUpdate::Closed { .. } | LinkUpdate::Failed(_) => {
                self.sync_status();
                if self.flag(settings::AUTO_RECONNECT) {
                    self.supervisor.start(now);
                }
            }
            LinkUpdate::Messages(messages) => {
                for message in messages {
                    self.receive(message, now);
                }
            }
        }
    }

    /// Apply one inbound message.
    ///
    /// The first argument becomes the new value. Unknown addresses and
    /// empty messages are logged and ignored; a message to a button fires
    /// it.
    pub fn receive(&mut self, message: OscMessage, now: Instant) {
        let Some(id) = self.tree.id(&message.address) else {
            log::debug!("[panel] Unknown address: {}", message.address);
            return;
        };
        let Some(arg) = message.args.first() else {
            log::debug!("[panel] Message to {} has no arguments", message.address);
            return;
        };

        match self.tree.node(id).tag() {
            Tag::Button => self.trigger(&message.address, Origin::Remote, now),
            Tag::Folder => log::debug!("[panel] Ignoring message to folder {}", message.address),
            _ => {
                let Some(value) = arg.to_param() else {
                    log::debug!("[panel] Argument {arg} for {} carries no value", message.address);
                    return;
                };
                match self.apply(id, value, Origin::Remote, now) {
                    Ok(_) => self.controls.mark_changed(&message.address, now + REMOTE_HIGHLIGHT),
                    Err(e) => log::debug!("[panel] Rejected {message}: {e:#}"),
                }
            }
        }
    }

    /// Run the reconnect timer. Call regularly from the event loop.
    pub fn tick(&mut self, now: Instant) {
        if self.supervisor.poll(now) && self.bridge.status() == ConnectionStatus::Disconnected {
            log::debug!("[panel] Attempting to reconnect");
            self.connect(now);
        }
    }

    /// Flip panel visibility.
    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
        log::debug!("[panel] Visible: {}", self.visible);
    }

    /// Mirror the bridge status into the status label.
    fn sync_status(&mut self) {
        let text = self.bridge.status().to_string();
        if self.tree.value(settings::STATUS).as_ref().and_then(ParamValue::as_text) == Some(text.as_str()) {
            return;
        }
        let Some(id) = self.tree.id(settings::STATUS) else {
            return;
        };
        match self.tree.set(id, ParamValue::Text(text)) {
            Ok(stored) => self.observers.notify_value(settings::STATUS, &stored),
            Err(e) => log::debug!("[panel] Status label not updated: {e:#}"),
        }
    }
}

#[cfg(test)]
mod tests;
