//! Unified event channel for the panel event loop.
//!
//! Connection threads send events through a single
//! `mpsc::UnboundedSender<PanelEvent>`; embedding code can send
//! [`PanelEvent::Shutdown`] on the same channel to stop the loop.
//! Whichever loop owns the panel (TUI or headless) drains the receiver and hands each event to
//! [`Panel::handle_event`](crate::panel::Panel::handle_event).

// Rust guideline compliant 2026-02

use std::fmt;

/// Identifies one connection attempt.
///
/// Every `connect` allocates a fresh id, so events from a connection that
/// has since been closed or replaced can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws_{}", self.0)
    }
}

/// Event from a background producer delivered to the panel loop.
#[derive(Debug)]
pub enum PanelEvent {
    /// Event from a connection thread.
    Link(LinkEvent),

    /// Stop the loop.
    Shutdown,
}

/// An event produced by a connection thread.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEvent {
    /// Which connection produced this event.
    pub connection_id: ConnectionId,
    /// The event payload.
    pub kind: LinkEventKind,
}

/// Payload of a [`LinkEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEventKind {
    /// Handshake completed.
    Open,
    /// Binary frame (an OSC packet).
    Packet(Vec<u8>),
    /// Text frame (the JSON message form).
    Text(String),
    /// Connection closed, by either side.
    Close {
        /// WebSocket close code (1000 = normal).
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
    /// Connect or transport failure; the connection is gone.
    Error(String),
}

impl LinkEventKind {
    /// Whether the connection is finished after this event.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Close { .. } | Self::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_kinds() {
        assert!(LinkEventKind::Error("x".into()).is_terminal());
        assert!(LinkEventKind::Close { code: 1000, reason: String::new() }.is_terminal());
        assert!(!LinkEventKind::Open.is_terminal());
        assert!(!LinkEventKind::Packet(vec![]).is_terminal());
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(3).to_string(), "ws_3");
    }
}
