//! Saved-settings inspection.

use std::io::Write;

use anyhow::Result;

use crate::persist::KeyValueStore;

/// Print every slot as pretty JSON under its key.
///
/// Slots that are not JSON are printed verbatim.
///
/// # Errors
///
/// Returns an error if the store cannot be read or `out` cannot be written.
pub fn show(store: &dyn KeyValueStore, out: &mut dyn Write) -> Result<()> {
    let keys = store.keys()?;
    if keys.is_empty() {
        writeln!(out, "(no saved settings)")?;
        return Ok(());
    }
    for key in keys {
        let Some(text) = store.get(&key)? else {
            continue;
        };
        writeln!(out, "{key}:")?;
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?,
            Err(_) => writeln!(out, "{text}")?,
        }
    }
    Ok(())
}

/// Delete every slot. Returns how many were removed.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub fn clear(store: &mut dyn KeyValueStore) -> Result<usize> {
    let keys = store.keys()?;
    for key in &keys {
        store.remove(key)?;
    }
    log::info!("[store] Cleared {} slots", keys.len());
    Ok(keys.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;

    #[test]
    fn test_show_pretty_prints_slots() {
        let mut store = MemoryStore::new();
        store.set("appSettings", r#"{"sides":6}"#).unwrap();
        store.set("notes", "plain text").unwrap();

        let mut out = Vec::new();
        show(&store, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("appSettings:\n{\n  \"sides\": 6\n}"));
        assert!(text.contains("notes:\nplain text"));
    }

    #[test]
    fn test_show_empty_store() {
        let mut out = Vec::new();
        show(&MemoryStore::new(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "(no saved settings)\n");
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(clear(&mut store).unwrap(), 2);
        assert!(store.keys().unwrap().is_empty());
    }
}
