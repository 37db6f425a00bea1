//! Settings survive restarts through the file store.

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Result};
use osc_panel::bridge::{Connector, Outgoing};
use osc_panel::events::ConnectionId;
use osc_panel::{settings, FileStore, FolderDef, KeyValueStore, Panel, PanelEvent, PanelOptions, ParamValue};
use tempfile::TempDir;
use tokio::sync::mpsc;

struct Offline;

impl Connector for Offline {
    fn open(
        &mut self,
        url: &str,
        _id: ConnectionId,
        _events: mpsc::UnboundedSender<PanelEvent>,
    ) -> Result<mpsc::UnboundedSender<Outgoing>> {
        bail!("offline: {url}")
    }
}

fn demo_params() -> FolderDef {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/polygon.json");
    FolderDef::from_path(&path).unwrap()
}

fn start_panel(store_path: &Path) -> Panel {
    let (events, _rx) = mpsc::unbounded_channel();
    let mut panel = Panel::new(
        demo_params(),
        Box::new(Offline),
        Box::new(FileStore::new(store_path)),
        events,
        PanelOptions::default(),
    )
    .unwrap();
    panel.start(Instant::now());
    panel
}

#[test]
fn test_demo_definitions_load() {
    let def = demo_params();
    let names: Vec<&str> = def.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["sides", "radius", "rotation", "spin", "look", "randomize", "fps"]);
}

#[test]
fn test_saved_values_survive_restart() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("storage.json");
    let now = Instant::now();

    let mut panel = start_panel(&store_path);
    panel.edit("/sides", ParamValue::Number(9.0), now).unwrap();
    panel.edit("/look/title", ParamValue::Text("nonagon".into()), now).unwrap();
    panel.edit(settings::PORT, ParamValue::Number(9001.0), now).unwrap();
    panel.press("/settings/gui/save", now).unwrap();
    drop(panel);

    let panel = start_panel(&store_path);
    assert_eq!(panel.value("/sides"), Some(ParamValue::Number(9.0)));
    assert_eq!(panel.value("/look/title"), Some(ParamValue::Text("nonagon".into())));
    assert_eq!(panel.value(settings::PORT), Some(ParamValue::Number(9001.0)));
}

#[test]
fn test_unsaved_edits_are_lost() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("storage.json");

    let mut panel = start_panel(&store_path);
    panel.edit("/sides", ParamValue::Number(11.0), Instant::now()).unwrap();
    drop(panel);

    let panel = start_panel(&store_path);
    assert_eq!(panel.value("/sides"), Some(ParamValue::Number(5.0)));
}

#[test]
fn test_reset_restores_factory_defaults() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("storage.json");
    let now = Instant::now();

    let mut panel = start_panel(&store_path);
    panel.edit("/radius", ParamValue::Number(0.9), now).unwrap();
    panel.edit("/spin", ParamValue::Bool(true), now).unwrap();
    panel.press("/settings/gui/reset", now).unwrap();

    assert_eq!(panel.value("/radius"), Some(ParamValue::Number(0.4)));
    assert_eq!(panel.value("/spin"), Some(ParamValue::Bool(false)));
}

#[test]
fn test_unsaved_label_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("storage.json");

    let mut panel = start_panel(&store_path);
    panel.edit("/fps", ParamValue::Text("60".into()), Instant::now()).unwrap();
    panel.save();

    let store = FileStore::new(&store_path);
    let saved = store.get("appSettings").unwrap().unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert!(snapshot.get("fps").is_none());
    assert_eq!(snapshot["sides"], 5);
}
