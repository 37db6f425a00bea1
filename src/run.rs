//! Headless event loop: the panel without a terminal.
//!
//! Used with `start --headless`, e.g. to keep a bridge running under a
//! process supervisor with saved settings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::events::PanelEvent;
use crate::panel::Panel;

/// Drain pending events and run the timer once.
///
/// Returns `false` once a shutdown event has been handled.
pub fn pump(panel: &mut Panel, events: &mut mpsc::UnboundedReceiver<PanelEvent>, now: Instant) -> bool {
    while let Ok(event) = events.try_recv() {
        if !panel.handle_event(event, now) {
            return false;
        }
    }
    panel.tick(now);
    true
}

/// Run until `shutdown` is set or a shutdown event arrives.
pub fn run_headless(
    panel: &mut Panel,
    events: &mut mpsc::UnboundedReceiver<PanelEvent>,
    shutdown: &AtomicBool,
    tick: Duration,
) {
    log::info!("[headless] Event loop starting (status: {})", panel.status());
    while !shutdown.load(Ordering::SeqCst) {
        if !pump(panel, events, Instant::now()) {
            break;
        }
        std::thread::sleep(tick);
    }
    log::info!("[headless] Event loop exiting");
}
