//! Per-address echo suppression.
//!
//! Peers that mirror every message they receive would bounce each edit
//! straight back. With a non-zero window, an inbound argument equal to the
//! one last sent to the same address within the window is dropped once.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::osc::OscArg;

/// Remembers the last argument sent per address.
#[derive(Debug, Default)]
pub struct EchoGuard {
    window: Duration,
    recent: HashMap<String, (OscArg, Instant)>,
}

impl EchoGuard {
    /// Guard with the given window. A zero window disables suppression.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { window, recent: HashMap::new() }
    }

    /// Whether suppression is active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    /// Record an outbound argument.
    pub fn record(&mut self, address: &str, arg: &OscArg, now: Instant) {
        if self.is_enabled() {
            self.recent.insert(address.to_string(), (arg.clone(), now));
        }
    }

    /// Whether an inbound argument is the echo of a recent send.
    ///
    /// A matching entry is consumed, so a second identical message is let
    /// through. Expired entries are pruned on the way.
    pub fn is_echo(&mut self, address: &str, arg: &OscArg, now: Instant) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let window = self.window;
        self.recent
            .retain(|_, (_, sent)| now.saturating_duration_since(*sent) <= window);
        match self.recent.get(address) {
            Some((sent, _)) if sent == arg => {
                self.recent.remove(address);
                true
            }
            _ => false,
        }
    }

    /// Forget everything (on disconnect).
    pub fn clear(&mut self) {
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_guard_never_suppresses() {
        let mut guard = EchoGuard::new(Duration::ZERO);
        let now = Instant::now();
        guard.record("/a", &OscArg::Int(1), now);
        assert!(!guard.is_echo("/a", &OscArg::Int(1), now));
    }

    #[test]
    fn test_matching_echo_suppressed_once() {
        let mut guard = EchoGuard::new(Duration::from_millis(200));
        let now = Instant::now();
        guard.record("/a", &OscArg::Int(1), now);

        assert!(!guard.is_echo("/a", &OscArg::Int(2), now));
        assert!(!guard.is_echo("/b", &OscArg::Int(1), now));
        assert!(guard.is_echo("/a", &OscArg::Int(1), now + Duration::from_millis(50)));
        assert!(!guard.is_echo("/a", &OscArg::Int(1), now + Duration::from_millis(60)));
    }

    #[test]
    fn test_expired_entries_pass() {
        let mut guard = EchoGuard::new(Duration::from_millis(100));
        let now = Instant::now();
        guard.record("/a", &OscArg::Float(0.5), now);
        assert!(!guard.is_echo("/a", &OscArg::Float(0.5), now + Duration::from_millis(150)));
    }
}
