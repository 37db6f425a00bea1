use super::*;
use crate::bridge::Outgoing;
use crate::events::{ConnectionId, LinkEvent, LinkEventKind};
use crate::osc::{codec, OscArg};
use crate::param::NodeDef;
use crate::persist::MemoryStore;
use std::cell::RefCell;
use std::rc::Rc;

type Opened = Rc<RefCell<Vec<(String, ConnectionId, mpsc::UnboundedReceiver<Outgoing>)>>>;

#[derive(Default)]
struct Recorder {
    opened: Opened,
}

impl Connector for Recorder {
    fn open(
        &mut self,
        url: &str,
        id: ConnectionId,
        _events: mpsc::UnboundedSender<PanelEvent>,
    ) -> Result<mpsc::UnboundedSender<Outgoing>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.opened.borrow_mut().push((url.to_string(), id, rx));
        Ok(tx)
    }
}

struct Harness {
    panel: Panel,
    store: MemoryStore,
    opened: Opened,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    fn with_store(store: MemoryStore) -> Self {
        let recorder = Recorder::default();
        let opened = Rc::clone(&recorder.opened);
        let (events, _rx) = mpsc::unbounded_channel();
        let app = FolderDef::new()
            .with("sides", NodeDef::number(3.0).range(3.0, 12.0).step(1.0))
            .with("spin", NodeDef::button());
        let mut panel = Panel::new(
            app,
            Box::new(recorder),
            Box::new(store.clone()),
            events,
            PanelOptions::default(),
        )
        .unwrap();
        let now = Instant::now();
        panel.start(now);
        Self { panel, store, opened, now }
    }

    fn open(&mut self) -> ConnectionId {
        self.panel.connect(self.now);
        let id = self.opened.borrow().last().unwrap().1;
        self.link(id, LinkEventKind::Open);
        id
    }

    fn link(&mut self, id: ConnectionId, kind: LinkEventKind) {
        let event = PanelEvent::Link(LinkEvent { connection_id: id, kind });
        assert!(self.panel.handle_event(event, self.now));
    }

    /// Every packet queued on connection `index`, decoded.
    fn sent(&self, index: usize) -> Vec<OscMessage> {
        let mut opened = self.opened.borrow_mut();
        let rx = &mut opened[index].2;
        let mut out = Vec::new();
        while let Ok(command) = rx.try_recv() {
            if let Outgoing::Packet(packet) = command {
                out.extend(codec::decode(&packet).unwrap());
            }
        }
        out
    }
}

#[test]
fn test_first_start_writes_both_slots() {
    let h = Harness::new();
    assert!(h.store.get(crate::constants::FACTORY_DEFAULT_SLOT).unwrap().is_some());
    assert!(h.store.get(crate::constants::APP_SETTINGS_SLOT).unwrap().is_some());
    assert_eq!(h.panel.value("/sides"), Some(ParamValue::Number(3.0)));
    assert_eq!(
        h.panel.value(settings::STATUS),
        Some(ParamValue::Text("Disconnected".into()))
    );
}

#[test]
fn test_second_start_reloads_saved_settings() {
    let mut h = Harness::new();
    h.panel.edit("/sides", ParamValue::Number(8.0), h.now).unwrap();
    h.panel.save();

    let h2 = Harness::with_store(h.store.clone());
    assert_eq!(h2.panel.value("/sides"), Some(ParamValue::Number(8.0)));
}

#[test]
fn test_edit_while_disconnected_stores_without_sending() {
    let mut h = Harness::new();
    let stored = h.panel.edit(settings::PORT, ParamValue::Number(9000.0), h.now).unwrap();
    assert_eq!(stored, ParamValue::Number(9000.0));
    assert_eq!(h.panel.value(settings::PORT), Some(ParamValue::Number(9000.0)));
    assert!(h.opened.borrow().is_empty());
}

#[test]
fn test_edit_while_connected_sends_int() {
    let mut h = Harness::new();
    h.open();
    h.panel.edit("/sides", ParamValue::Number(6.0), h.now).unwrap();
    assert_eq!(h.sent(0), vec![OscMessage::new("/sides", OscArg::Int(6))]);
}

#[test]
fn test_edit_rejects_buttons_and_unknown() {
    let mut h = Harness::new();
    assert!(h.panel.edit("/spin", ParamValue::Bool(true), h.now).is_err());
    assert!(h.panel.edit("/nope", ParamValue::Bool(true), h.now).is_err());
    assert!(h.panel.press("/sides", h.now).is_err());
}

#[test]
fn test_inbound_updates_tree_and_notifies() {
    let mut h = Harness::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    h.panel
        .on_change("/sides", move |v| sink.borrow_mut().push(v.clone()))
        .unwrap();
    let id = h.open();

    h.link(id, LinkEventKind::Text(r#"{"address":"/sides","args":[{"value":5}]}"#.into()));
    assert_eq!(h.panel.value("/sides"), Some(ParamValue::Number(5.0)));
    assert_eq!(*seen.borrow(), vec![ParamValue::Number(5.0)]);
    // Remote changes are not sent back.
    assert!(h.sent(0).is_empty());
    assert!(h.panel.controls().get("/sides").unwrap().is_highlighted(h.now));
}

#[test]
fn test_inbound_unknown_or_empty_is_ignored() {
    let mut h = Harness::new();
    let id = h.open();
    let before = h.panel.tree().snapshot();
    h.link(id, LinkEventKind::Text(r#"{"address":"/ghost","args":[1]}"#.into()));
    h.link(id, LinkEventKind::Text(r#"{"address":"/sides","args":[]}"#.into()));
    assert_eq!(h.panel.tree().snapshot(), before);
}

#[test]
fn test_inbound_to_button_fires_it() {
    let mut h = Harness::new();
    let hits = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&hits);
    h.panel
        .on_press("/spin", move |tree| {
            assert!(tree.get("/sides").is_some());
            *sink.borrow_mut() += 1;
        })
        .unwrap();
    let id = h.open();
    h.link(id, LinkEventKind::Text(r#"{"address":"/spin","args":[1]}"#.into()));
    h.panel.press("/spin", h.now).unwrap();
    assert_eq!(*hits.borrow(), 2);
}

#[test]
fn test_reset_without_factory_slot_is_noop() {
    let mut h = Harness::new();
    h.panel.edit("/sides", ParamValue::Number(9.0), h.now).unwrap();
    h.store.remove(crate::constants::FACTORY_DEFAULT_SLOT).unwrap();
    h.panel.reset(h.now);
    assert_eq!(h.panel.value("/sides"), Some(ParamValue::Number(9.0)));
}

#[test]
fn test_reset_restores_defaults_and_sends() {
    let mut h = Harness::new();
    h.open();
    h.panel.edit("/sides", ParamValue::Number(9.0), h.now).unwrap();
    h.sent(0);
    h.panel.press("/settings/gui/reset", h.now).unwrap();
    assert_eq!(h.panel.value("/sides"), Some(ParamValue::Number(3.0)));
    assert!(h.sent(0).contains(&OscMessage::new("/sides", OscArg::Int(3))));
}

#[test]
fn test_status_label_follows_connection() {
    let mut h = Harness::new();
    h.panel.connect(h.now);
    assert_eq!(h.panel.value(settings::STATUS), Some(ParamValue::Text("Connecting".into())));
    let id = h.opened.borrow()[0].1;
    h.link(id, LinkEventKind::Open);
    assert_eq!(h.panel.value(settings::STATUS), Some(ParamValue::Text("Connected".into())));
    h.link(id, LinkEventKind::Close { code: 1006, reason: String::new() });
    assert_eq!(h.panel.status(), ConnectionStatus::Disconnected);
    assert_eq!(h.panel.value(settings::STATUS), Some(ParamValue::Text("Disconnected".into())));
}

#[test]
fn test_auto_reconnect_retries_and_stops() {
    let mut h = Harness::new();
    h.panel.edit(settings::AUTO_RECONNECT, ParamValue::Bool(true), h.now).unwrap();
    assert!(h.panel.is_reconnecting());

    let interval = RECONNECT_INTERVAL;
    h.panel.tick(h.now + interval);
    assert_eq!(h.opened.borrow().len(), 1);

    // The attempt fails; the timer keeps running.
    let id = h.opened.borrow()[0].1;
    h.link(id, LinkEventKind::Error("refused".into()));
    h.panel.tick(h.now + interval * 2);
    assert_eq!(h.opened.borrow().len(), 2);

    let id = h.opened.borrow()[1].1;
    h.link(id, LinkEventKind::Error("refused".into()));
    h.panel.edit(settings::AUTO_RECONNECT, ParamValue::Bool(false), h.now).unwrap();
    assert!(!h.panel.is_reconnecting());
    h.panel.tick(h.now + interval * 10);
    assert_eq!(h.opened.borrow().len(), 2);
}

#[test]
fn test_successful_open_stops_timer() {
    let mut h = Harness::new();
    h.panel.edit(settings::AUTO_RECONNECT, ParamValue::Bool(true), h.now).unwrap();
    h.panel.tick(h.now + RECONNECT_INTERVAL);
    let id = h.opened.borrow()[0].1;
    h.link(id, LinkEventKind::Open);
    assert!(!h.panel.is_reconnecting());
}

#[test]
fn test_manual_disconnect_stays_disconnected() {
    let mut h = Harness::new();
    h.panel.edit(settings::AUTO_RECONNECT, ParamValue::Bool(true), h.now).unwrap();
    let id = h.open();
    h.panel.press("/settings/websocket/disconnect", h.now).unwrap();
    // The thread's close arrives after the link was dropped.
    h.link(id, LinkEventKind::Close { code: 1000, reason: "client requested close".into() });
    assert!(!h.panel.is_reconnecting());
    h.panel.tick(h.now + RECONNECT_INTERVAL * 3);
    assert_eq!(h.opened.borrow().len(), 1);
}

#[test]
fn test_port_edit_while_connected_reconnects() {
    let mut h = Harness::new();
    h.open();
    h.panel.edit(settings::PORT, ParamValue::Number(9000.0), h.now).unwrap();
    let opened = h.opened.borrow();
    assert_eq!(opened.len(), 2);
    assert_eq!(opened[1].0, "ws://127.0.0.1:9000");
    drop(opened);
    assert_eq!(h.panel.status(), ConnectionStatus::Connecting);
}

#[test]
fn test_dump_sends_every_leaf() {
    let mut h = Harness::new();
    assert_eq!(h.panel.dump(), 0);
    h.open();
    let leaves = h.panel.tree().leaves().count();
    assert_eq!(h.panel.dump(), leaves);
    let sent = h.sent(0);
    assert_eq!(sent.len(), leaves);
    assert!(sent.contains(&OscMessage::new(settings::PORT, OscArg::Int(8080))));
}

#[test]
fn test_hide_button_toggles_visibility() {
    let mut h = Harness::new();
    assert!(h.panel.is_visible());
    h.panel.press("/settings/gui/hide", h.now).unwrap();
    assert!(!h.panel.is_visible());
    assert!(h.panel.controls().get("/settings/gui/hide").unwrap().is_flashing(h.now));
}

#[test]
fn test_auto_hide_and_connect_at_startup() {
    let mut h = Harness::new();
    h.panel.edit(settings::AUTO_HIDE, ParamValue::Bool(true), h.now).unwrap();
    h.panel.edit(settings::AUTO_CONNECT, ParamValue::Bool(true), h.now).unwrap();
    h.panel.save();

    let h2 = Harness::with_store(h.store.clone());
    assert!(!h2.panel.is_visible());
    assert_eq!(h2.opened.borrow().len(), 1);
    assert_eq!(h2.panel.status(), ConnectionStatus::Connecting);
}

#[test]
fn test_shutdown_event_stops_loop() {
    let mut h = Harness::new();
    assert!(!h.panel.handle_event(PanelEvent::Shutdown, h.now));
}

#[test]
fn test_observe_unknown_address_fails() {
    let mut h = Harness::new();
    assert!(h.panel.on_change("/ghost", |_| {}).is_err());
}
