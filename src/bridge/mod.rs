//! Protocol bridge: one OSC-over-WebSocket connection.
//!
//! The bridge owns the current connection's command channel and its status.
//! Outbound values are encoded as binary OSC packets. Inbound frames arrive
//! as [`LinkEvent`]s from the connection thread and come back out of
//! [`Bridge::handle`] as decoded messages for the panel to apply.
//!
//! Every `connect` allocates a new [`ConnectionId`]; events carrying any
//! other id belong to a connection that was closed or replaced and are
//! dropped. Nothing here returns transport errors to the caller: failures
//! are logged and the message is dropped.
//!
//! # Modules
//!
//! - [`connector`] - the transport seam and the thread-per-connection client
//! - [`echo`] - optional echo suppression

// Rust guideline compliant 2026-02

pub mod connector;
pub mod echo;

use std::fmt;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

pub use connector::{Connector, Outgoing, WsConnector};
pub use echo::EchoGuard;

use crate::events::{ConnectionId, LinkEvent, LinkEventKind, PanelEvent};
use crate::osc::{codec, json, OscArg, OscMessage};
use crate::param::value::integral;
use crate::param::{ParamTree, ParamValue};
use crate::settings;
use crate::ws;

/// Connection state shown in the status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No connection.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Open; sends go out.
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        })
    }
}

/// What a connection event means for the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkUpdate {
    /// The connection opened.
    Opened,
    /// The connection closed.
    Closed {
        /// WebSocket close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// Connecting failed or the transport broke.
    Failed(String),
    /// Messages to apply, in arrival order.
    Messages(Vec<OscMessage>),
}

/// The current connection.
#[derive(Debug)]
struct Link {
    id: ConnectionId,
    url: String,
    commands: mpsc::UnboundedSender<Outgoing>,
}

/// Owner of the (at most one) connection.
pub struct Bridge {
    connector: Box<dyn Connector>,
    events: mpsc::UnboundedSender<PanelEvent>,
    status: ConnectionStatus,
    link: Option<Link>,
    next_id: u64,
    echo: EchoGuard,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("status", &self.status)
            .field("link", &self.link)
            .field("next_id", &self.next_id)
            .field("echo", &self.echo)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Create a disconnected bridge.
    ///
    /// `events` is the panel loop's channel; it is handed to every
    /// connection the bridge opens.
    #[must_use]
    pub fn new(
        connector: Box<dyn Connector>,
        events: mpsc::UnboundedSender<PanelEvent>,
        echo_window: Duration,
    ) -> Self {
        Self {
            connector,
            events,
            status: ConnectionStatus::Disconnected,
            link: None,
            next_id: 0,
            echo: EchoGuard::new(echo_window),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// URL of the current connection, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.url.as_str())
    }

    /// Id of the current connection, if any.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.link.as_ref().map(|link| link.id)
    }

    /// Connect to the endpoint named by the settings leaves of `tree`.
    ///
    /// Any existing connection is closed first, even when the settings do
    /// not name a usable endpoint.
    pub fn connect(&mut self, tree: &ParamTree) {
        match endpoint(tree) {
            Some(url) => self.connect_url(&url),
            None => {
                log::warn!("[bridge] Settings do not name a usable endpoint");
                self.disconnect();
            }
        }
    }

    /// Connect to `url`, closing any existing connection first.
    pub fn connect_url(&mut self, url: &str) {
        if self.link.is_some() {
            log::debug!("[bridge] Closing previous connection before reconnecting");
            self.disconnect();
        }

        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        match self.connector.open(url, id, self.events.clone()) {
            Ok(commands) => {
                log::info!("[bridge] Connecting to {url} ({id})");
                self.link = Some(Link { id, url: url.to_string(), commands });
                self.status = ConnectionStatus::Connecting;
            }
            Err(e) => {
                log::warn!("[bridge] Failed to start connection to {url}: {e:#}");
                self.status = ConnectionStatus::Disconnected;
            }
        }
    }

    /// Close the current connection. Returns whether there was one.
    pub fn disconnect(&mut self) -> bool {
        self.status = ConnectionStatus::Disconnected;
        self.echo.clear();
        let Some(link) = self.link.take() else {
            return false;
        };
        log::info!("[bridge] Disconnecting from {} ({})", link.url, link.id);
        if link.commands.send(Outgoing::Close).is_err() {
            log::debug!("[bridge] Connection {} already gone", link.id);
        }
        true
    }

    /// Send `value` to `address`.
    ///
    /// A no-op unless connected. Returns whether the packet was queued.
    pub fn send(&mut self, address: &str, value: &ParamValue) -> bool {
        self.send_message(&OscMessage::new(address, OscArg::from_param(value)))
    }

    /// Send an already built message. Same rules as [`Bridge::send`].
    pub fn send_message(&mut self, message: &OscMessage) -> bool {
        let Some(link) = self.link.as_ref().filter(|_| self.status == ConnectionStatus::Connected)
        else {
            log::debug!("[bridge] Not connected, not sending {message}");
            return false;
        };

        let packet = match codec::encode(message) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("[bridge] Cannot encode {message}: {e:#}");
                return false;
            }
        };
        if link.commands.send(Outgoing::Packet(packet)).is_err() {
            log::warn!("[bridge] Connection {} gone, dropped {message}", link.id);
            return false;
        }

        log::debug!("[bridge] -> {message}");
        if let Some(arg) = message.args.first() {
            self.echo.record(&message.address, arg, Instant::now());
        }
        true
    }

    /// Apply a connection event.
    ///
    /// Returns `None` for events of stale connections and for frames that
    /// decode to nothing.
    pub fn handle(&mut self, event: LinkEvent) -> Option<LinkUpdate> {
        let LinkEvent { connection_id, kind } = event;
        if self.connection_id() != Some(connection_id) {
            log::debug!("[bridge] Ignoring {kind:?} from stale connection {connection_id}");
            return None;
        }

        match kind {
            LinkEventKind::Open => {
                log::info!("[bridge] Connected ({connection_id})");
                self.status = ConnectionStatus::Connected;
                Some(LinkUpdate::Opened)
            }
            LinkEventKind::Packet(data) => match codec::decode(&data) {
                Ok(messages) => self.inbound(messages),
                Err(e) => {
                    log::warn!("[bridge] Dropping undecodable packet ({} bytes): {e:#}", data.len());
                    None
                }
            },
            LinkEventKind::Text(text) => match json::decode(&text) {
                Ok(messages) => self.inbound(messages),
                Err(e) => {
                    log::warn!("[bridge] Dropping undecodable text frame: {e:#}");
                    None
                }
            },
            LinkEventKind::Close { code, reason } => {
                log::info!("[bridge] Connection {connection_id} closed ({code}) {reason}");
                self.drop_link();
                Some(LinkUpdate::Closed { code, reason })
            }
            LinkEventKind::Error(error) => {
                log::warn!("[bridge] Connection {connection_id} failed: {error}");
                self.drop_link();
                Some(LinkUpdate::Failed(error))
            }
        }
    }

    fn drop_link(&mut self) {
        self.link = None;
        self.status = ConnectionStatus::Disconnected;
        self.echo.clear();
    }

    fn inbound(&mut self, messages: Vec<OscMessage>) -> Option<LinkUpdate> {
        let now = Instant::now();
        let messages: Vec<OscMessage> = messages
            .into_iter()
            .filter(|message| {
                log::debug!("[bridge] <- {message}");
                match message.args.first() {
                    Some(arg) if self.echo.is_echo(&message.address, arg, now) => {
                        log::debug!("[bridge] Suppressed echo on {}", message.address);
                        false
                    }
                    _ => true,
                }
            })
            .collect();
        (!messages.is_empty()).then_some(LinkUpdate::Messages(messages))
    }
}

/// `ws://host:port` from the settings leaves of `tree`.
#[must_use]
pub fn endpoint(tree: &ParamTree) -> Option<String> {
    let host = tree.value(settings::ADDRESS)?;
    let host = host.as_text()?;
    let port = tree
        .value(settings::PORT)?
        .as_number()
        .and_then(integral)
        .and_then(|p| u16::try_from(p).ok())?;
    Some(ws::endpoint_url(host, port))
}
