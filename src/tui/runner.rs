//! TUI runner: the interactive event loop.
//!
//! ```text
//! TuiRunner
//! ├── terminal: Terminal<B>        - ratatui terminal
//! ├── panel: Panel                 - all parameter and connection state
//! ├── view: ViewState              - selection and edit prompt
//! ├── events: UnboundedReceiver    - connection events from link threads
//! └── shutdown: Arc<AtomicBool>    - set by signal handlers
//! ```
//!
//! Each iteration drains connection events, runs the reconnect timer,
//! renders, then waits up to one frame for a key.

// Rust guideline compliant 2026-02

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use super::input::event_to_action;
use super::render::render;
use super::view::ViewState;
use crate::constants::FRAME_RATE_DELAY;
use crate::events::PanelEvent;
use crate::panel::Panel;

/// Interactive panel loop.
pub struct TuiRunner<B>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    terminal: Terminal<B>,
    panel: Panel,
    view: ViewState,
    events: mpsc::UnboundedReceiver<PanelEvent>,
    shutdown: Arc<AtomicBool>,
    quit: bool,
}

impl<B> std::fmt::Debug for TuiRunner<B>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TuiRunner")
            .field("panel", &self.panel)
            .field("view", &self.view)
            .field("quit", &self.quit)
            .finish_non_exhaustive()
    }
}

impl<B> TuiRunner<B>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    /// Create a runner around a started panel.
    pub fn new(
        terminal: Terminal<B>,
        panel: Panel,
        events: mpsc::UnboundedReceiver<PanelEvent>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            terminal,
            panel,
            view: ViewState::new(),
            events,
            shutdown,
            quit: false,
        }
    }

    /// The panel being driven.
    #[must_use]
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// The view state.
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Check if the runner should quit.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit || self.shutdown.load(Ordering::SeqCst)
    }

    /// Run until the user quits, a shutdown event arrives or a signal sets
    /// the shutdown flag.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        log::info!("[tui] Event loop starting");

        while !self.should_quit() {
            self.poll_panel_events();
            if self.should_quit() {
                break;
            }

            let now = Instant::now();
            self.panel.tick(now);
            render(&mut self.terminal, &self.panel, &self.view, now)?;

            self.poll_input()?;
        }

        log::info!("[tui] Event loop exiting");
        Ok(())
    }

    fn poll_input(&mut self) -> Result<()> {
        if event::poll(FRAME_RATE_DELAY)? {
            let ev = event::read()?;
            self.handle_input_event(&ev);
        }
        Ok(())
    }

    /// Map a terminal event to an action and apply it.
    pub fn handle_input_event(&mut self, event: &Event) {
        let mode = self.view.mode(&self.panel);
        if let Some(action) = event_to_action(event, mode) {
            if !self.view.apply(&mut self.panel, action, Instant::now()) {
                self.quit = true;
            }
        }
    }

    /// Drain pending connection events without blocking.
    pub fn poll_panel_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if !self.panel.handle_event(event, Instant::now()) {
                log::info!("[tui] Shutdown event received");
                self.quit = true;
                return;
            }
        }
    }
}
