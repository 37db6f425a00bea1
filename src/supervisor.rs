//! Fixed-interval reconnect timer.
//!
//! A single repeating deadline, polled from the panel loop. The supervisor
//! only decides *when* a retry is due; the panel checks the connection
//! status and calls `connect`. There is no backoff.

use std::time::{Duration, Instant};

/// Reconnect timer state.
#[derive(Debug, Clone)]
pub struct ReconnectSupervisor {
    interval: Duration,
    /// When the next attempt is due. `None` while stopped.
    next_due: Option<Instant>,
}

impl ReconnectSupervisor {
    /// Stopped supervisor with the given retry interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, next_due: None }
    }

    /// Retry interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the timer; the first attempt is one interval from `now`.
    ///
    /// Starting an armed timer leaves its schedule unchanged.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            log::debug!("[supervisor] Armed, retrying every {:?}", self.interval);
            self.next_due = Some(now + self.interval);
        }
    }

    /// Disarm the timer. Idempotent.
    pub fn stop(&mut self) {
        if self.next_due.take().is_some() {
            log::debug!("[supervisor] Stopped");
        }
    }

    /// Whether the timer is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time left until the next attempt, for loops that want to sleep.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Whether an attempt is due at `now`. Reschedules when it is.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_stopped_never_fires() {
        let mut sup = ReconnectSupervisor::new(SECOND);
        let now = Instant::now();
        assert!(!sup.is_armed());
        assert!(!sup.poll(now + SECOND * 10));
    }

    #[test]
    fn test_fires_each_interval() {
        let mut sup = ReconnectSupervisor::new(SECOND);
        let t0 = Instant::now();
        sup.start(t0);
        assert!(!sup.poll(t0 + SECOND / 2));
        assert!(sup.poll(t0 + SECOND));
        assert!(!sup.poll(t0 + SECOND + SECOND / 2));
        assert!(sup.poll(t0 + SECOND * 2));
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut sup = ReconnectSupervisor::new(SECOND);
        let t0 = Instant::now();
        sup.start(t0);
        sup.start(t0 + SECOND / 2);
        assert_eq!(sup.remaining(t0), Some(SECOND));
    }

    #[test]
    fn test_stop_prevents_further_attempts() {
        let mut sup = ReconnectSupervisor::new(SECOND);
        let t0 = Instant::now();
        sup.start(t0);
        sup.stop();
        sup.stop();
        assert!(!sup.is_armed());
        assert!(!sup.poll(t0 + SECOND * 5));
        assert_eq!(sup.remaining(t0), None);
    }
}
