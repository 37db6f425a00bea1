//! Opening connections.
//!
//! [`Connector`] is the seam between the bridge and the transport. The
//! production [`WsConnector`] runs each connection on a dedicated OS thread
//! with a single-threaded tokio runtime. The thread never touches the panel:
//! it forwards frames as [`PanelEvent::Link`] events and takes outbound
//! packets and the close request from its own command channel.

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::events::{ConnectionId, LinkEvent, LinkEventKind, PanelEvent};
use crate::ws::{self, WsMessage};

/// Command from the bridge to a connection thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Send a binary frame.
    Packet(Vec<u8>),
    /// Initiate a graceful close.
    Close,
}

/// Opens connections on behalf of the bridge.
pub trait Connector {
    /// Start connecting to `url`.
    ///
    /// Returns immediately with the command channel of the new connection.
    /// Progress (open, frames, close, failure) arrives later on `events`,
    /// tagged with `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection could not even be started.
    fn open(
        &mut self,
        url: &str,
        id: ConnectionId,
        events: mpsc::UnboundedSender<PanelEvent>,
    ) -> Result<mpsc::UnboundedSender<Outgoing>>;
}

/// WebSocket connector: one thread per connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(
        &mut self,
        url: &str,
        id: ConnectionId,
        events: mpsc::UnboundedSender<PanelEvent>,
    ) -> Result<mpsc::UnboundedSender<Outgoing>> {
        let (send_tx, send_rx) = mpsc::unbounded_channel();
        let url = url.to_string();
        std::thread::Builder::new()
            .name(format!("osc-{id}"))
            .spawn(move || run_connection(&url, id, &events, send_rx))
            .context("failed to spawn connection thread")?;
        Ok(send_tx)
    }
}

fn emit(events: &mpsc::UnboundedSender<PanelEvent>, id: ConnectionId, kind: LinkEventKind) {
    if kind.is_terminal() {
        log::debug!("[bridge] Connection thread {id} finishing: {kind:?}");
    }
    // The receiver is gone only when the panel loop has exited.
    let _ = events.send(PanelEvent::Link(LinkEvent { connection_id: id, kind }));
}

/// Run a single connection until it closes or fails.
fn run_connection(
    url: &str,
    id: ConnectionId,
    events: &mpsc::UnboundedSender<PanelEvent>,
    mut send_rx: mpsc::UnboundedReceiver<Outgoing>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            emit(events, id, LinkEventKind::Error(format!("Failed to create tokio runtime: {e}")));
            return;
        }
    };

    rt.block_on(async {
        let (mut writer, mut reader) = match ws::connect(url).await {
            Ok(pair) => pair,
            Err(e) => {
                emit(events, id, LinkEventKind::Error(format!("{e:#}")));
                return;
            }
        };
        emit(events, id, LinkEventKind::Open);

        loop {
            tokio::select! {
                frame = reader.recv() => match frame {
                    Some(Ok(WsMessage::Binary(data))) => emit(events, id, LinkEventKind::Packet(data)),
                    Some(Ok(WsMessage::Text(text))) => emit(events, id, LinkEventKind::Text(text)),
                    Some(Ok(WsMessage::Close { code, reason })) => {
                        emit(events, id, LinkEventKind::Close { code, reason });
                        return;
                    }
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {
                        // Pings are auto-replied by tungstenite
                    }
                    Some(Err(e)) => {
                        emit(events, id, LinkEventKind::Error(format!("{e}")));
                        return;
                    }
                    None => {
                        emit(events, id, LinkEventKind::Close { code: 1006, reason: "stream ended".to_string() });
                        return;
                    }
                },
                outgoing = send_rx.recv() => match outgoing {
                    Some(Outgoing::Packet(data)) => {
                        if let Err(e) = writer.send_binary(data).await {
                            emit(events, id, LinkEventKind::Error(format!("WebSocket send failed: {e}")));
                            return;
                        }
                    }
                    Some(Outgoing::Close) => {
                        let _ = writer.send_close().await;
                        emit(events, id, LinkEventKind::Close { code: 1000, reason: "client requested close".to_string() });
                        return;
                    }
                    // Bridge dropped the handle without closing
                    None => return,
                },
            }
        }
    });
}
