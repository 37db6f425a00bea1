//! Keyboard-driven panel: keys in, OSC packets out, frames on a test backend.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use osc_panel::bridge::{Connector, Outgoing};
use osc_panel::events::{ConnectionId, LinkEvent, LinkEventKind};
use osc_panel::osc::codec;
use osc_panel::tui::TuiRunner;
use osc_panel::{FolderDef, MemoryStore, NodeDef, OscArg, OscMessage, Panel, PanelEvent, PanelOptions};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

type Links = Rc<RefCell<Vec<(ConnectionId, mpsc::UnboundedReceiver<Outgoing>)>>>;

/// Connector that records every opened connection.
#[derive(Default)]
struct Recording {
    links: Links,
}

impl Connector for Recording {
    fn open(
        &mut self,
        _url: &str,
        id: ConnectionId,
        _events: mpsc::UnboundedSender<PanelEvent>,
    ) -> Result<mpsc::UnboundedSender<Outgoing>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.links.borrow_mut().push((id, rx));
        Ok(tx)
    }
}

struct Fixture {
    runner: TuiRunner<TestBackend>,
    events: mpsc::UnboundedSender<PanelEvent>,
    links: Links,
}

fn fixture() -> Fixture {
    let connector = Recording::default();
    let links = Rc::clone(&connector.links);
    let (events, events_rx) = mpsc::unbounded_channel();
    let app = FolderDef::new()
        .with("sides", NodeDef::number(5.0).range(3.0, 12.0).step(1.0))
        .with("spin", NodeDef::boolean(false));
    let mut panel = Panel::new(
        app,
        Box::new(connector),
        Box::new(MemoryStore::new()),
        events.clone(),
        PanelOptions::default(),
    )
    .unwrap();
    panel.start(Instant::now());
    panel.connect(Instant::now());

    let terminal = Terminal::new(TestBackend::new(90, 16)).unwrap();
    let runner = TuiRunner::new(terminal, panel, events_rx, Arc::new(AtomicBool::new(false)));
    Fixture { runner, events, links }
}

impl Fixture {
    fn open_link(&mut self) {
        let id = self.links.borrow()[0].0;
        self.events
            .send(PanelEvent::Link(LinkEvent { connection_id: id, kind: LinkEventKind::Open }))
            .unwrap();
        self.runner.poll_panel_events();
    }

    fn press(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        self.runner.handle_input_event(&Event::Key(KeyEvent::new(code, modifiers)));
    }

    fn sent(&self) -> Vec<OscMessage> {
        let mut links = self.links.borrow_mut();
        let mut out = Vec::new();
        while let Ok(Outgoing::Packet(packet)) = links[0].1.try_recv() {
            out.extend(codec::decode(&packet).unwrap());
        }
        out
    }
}

#[test]
fn test_keys_send_changes_to_peer() {
    let mut f = fixture();
    f.open_link();

    // settings group is first; sides is the next row
    f.press(KeyCode::Down, KeyModifiers::NONE);
    f.press(KeyCode::Right, KeyModifiers::SHIFT);
    f.press(KeyCode::Down, KeyModifiers::NONE);
    f.press(KeyCode::Enter, KeyModifiers::NONE);

    assert_eq!(
        f.sent(),
        vec![
            OscMessage::new("/sides", OscArg::Int(12)),
            OscMessage::new("/spin", OscArg::Int(1)),
        ]
    );
}

#[test]
fn test_typed_value_is_constrained_before_sending() {
    let mut f = fixture();
    f.open_link();

    f.press(KeyCode::Down, KeyModifiers::NONE);
    f.press(KeyCode::Enter, KeyModifiers::NONE);
    f.press(KeyCode::Backspace, KeyModifiers::NONE);
    for c in "2.6".chars() {
        f.press(KeyCode::Char(c), KeyModifiers::NONE);
    }
    f.press(KeyCode::Enter, KeyModifiers::NONE);

    assert_eq!(f.sent(), vec![OscMessage::new("/sides", OscArg::Int(3))]);
}

#[test]
fn test_inbound_change_is_rendered() {
    let mut f = fixture();
    f.open_link();
    let id = f.links.borrow()[0].0;
    let packet = codec::encode(&OscMessage::new("/sides", OscArg::Int(9))).unwrap();
    f.events
        .send(PanelEvent::Link(LinkEvent { connection_id: id, kind: LinkEventKind::Packet(packet) }))
        .unwrap();
    f.runner.poll_panel_events();

    let mut terminal = Terminal::new(TestBackend::new(90, 16)).unwrap();
    osc_panel::tui::render::render(&mut terminal, f.runner.panel(), f.runner.view(), Instant::now())
        .unwrap();
    let buffer = terminal.backend().buffer();
    let row: String = (0..buffer.area.width).map(|x| buffer[(x, 2)].symbol().to_string()).collect();
    assert!(row.contains("sides  9  [3..12]"), "{row:?}");
    assert!(f.sent().is_empty());
}
