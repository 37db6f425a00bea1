//! Tree snapshots in a key-value store.
//!
//! A snapshot is the JSON text of [`ParamTree::snapshot`] stored under a
//! named slot ([`APP_SETTINGS_SLOT`](crate::constants::APP_SETTINGS_SLOT)
//! for the current settings, [`FACTORY_DEFAULT_SLOT`](crate::constants::FACTORY_DEFAULT_SLOT)
//! for the startup state).

pub mod store;

use anyhow::{Context, Result};
use serde_json::Value;

pub use store::{FileStore, MemoryStore};

use crate::param::ParamTree;

/// String slots by key.
pub trait KeyValueStore {
    /// Value of `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Every key present, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Write the persisted leaves of `tree` to `slot`.
///
/// # Errors
///
/// Returns an error if the store rejects the write.
pub fn write_slot(store: &mut dyn KeyValueStore, slot: &str, tree: &ParamTree) -> Result<()> {
    let text = serde_json::to_string(&tree.snapshot())?;
    store
        .set(slot, &text)
        .with_context(|| format!("failed to write slot '{slot}'"))?;
    log::debug!("[persist] Wrote '{slot}' ({} bytes)", text.len());
    Ok(())
}

/// Read the snapshot stored in `slot`, `None` if the slot is absent.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the slot is not JSON.
pub fn read_slot(store: &dyn KeyValueStore, slot: &str) -> Result<Option<Value>> {
    let Some(text) = store
        .get(slot)
        .with_context(|| format!("failed to read slot '{slot}'"))?
    else {
        return Ok(None);
    };
    let value = serde_json::from_str(&text).with_context(|| format!("slot '{slot}' is not JSON"))?;
    Ok(Some(value))
}
