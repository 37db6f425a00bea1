//! Declarative parameter definitions.
//!
//! Definitions describe a tree before it is built. They can be written in
//! JSON, in the same shape the panel has always accepted:
//!
//! ```json
//! {
//!   "sides": { "type": "number", "value": 5, "min": 3, "max": 12, "step": 1 },
//!   "look": { "type": "folder", "value": {
//!       "tint": { "type": "color", "value": "#ff8800" }
//!   } }
//! }
//! ```
//!
//! or assembled in code with [`FolderDef::with`] and the [`NodeDef`]
//! constructors. Key order is preserved and becomes display order.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::value::Color;

fn default_save() -> bool {
    true
}

/// Definition of a single node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeDef {
    /// On/off toggle.
    Boolean {
        /// Initial state.
        value: bool,
        /// Whether snapshots include this leaf.
        #[serde(default = "default_save")]
        save: bool,
    },
    /// Numeric slider.
    Number {
        /// Initial value.
        value: f64,
        /// Inclusive lower bound.
        #[serde(default)]
        min: Option<f64>,
        /// Inclusive upper bound.
        #[serde(default)]
        max: Option<f64>,
        /// Grid step anchored at `min`.
        #[serde(default)]
        step: Option<f64>,
        /// Whether snapshots include this leaf.
        #[serde(default = "default_save")]
        save: bool,
    },
    /// Editable text.
    String {
        /// Initial text.
        value: String,
        /// Whether snapshots include this leaf.
        #[serde(default = "default_save")]
        save: bool,
    },
    /// RGB color.
    Color {
        /// Initial color.
        value: Color,
        /// Whether snapshots include this leaf.
        #[serde(default = "default_save")]
        save: bool,
    },
    /// Momentary trigger. Any `value` in a definition file is ignored.
    Button {},
    /// Read-only text display.
    Label {
        /// Initial text.
        value: String,
        /// Whether snapshots include this leaf.
        #[serde(default = "default_save")]
        save: bool,
    },
    /// Group of child nodes.
    Folder {
        /// Children in display order.
        value: FolderDef,
    },
}

impl NodeDef {
    /// Boolean toggle.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::Boolean { value, save: true }
    }

    /// Unbounded number; chain [`NodeDef::range`] and [`NodeDef::step`].
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::Number { value, min: None, max: None, step: None, save: true }
    }

    /// Text field.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String { value: value.into(), save: true }
    }

    /// Color picker.
    #[must_use]
    pub fn color(value: Color) -> Self {
        Self::Color { value, save: true }
    }

    /// Momentary button.
    #[must_use]
    pub fn button() -> Self {
        Self::Button {}
    }

    /// Read-only label.
    #[must_use]
    pub fn label(value: impl Into<String>) -> Self {
        Self::Label { value: value.into(), save: true }
    }

    /// Folder of children.
    #[must_use]
    pub fn folder(children: FolderDef) -> Self {
        Self::Folder { value: children }
    }

    /// Set the bounds of a number. No effect on other kinds.
    #[must_use]
    pub fn range(mut self, lo: f64, hi: f64) -> Self {
        if let Self::Number { min, max, .. } = &mut self {
            *min = Some(lo);
            *max = Some(hi);
        }
        self
    }

    /// Set the step of a number. No effect on other kinds.
    #[must_use]
    pub fn step(mut self, by: f64) -> Self {
        if let Self::Number { step, .. } = &mut self {
            *step = Some(by);
        }
        self
    }

    /// Exclude this leaf from persisted snapshots.
    #[must_use]
    pub fn transient(mut self) -> Self {
        match &mut self {
            Self::Boolean { save, .. }
            | Self::Number { save, .. }
            | Self::String { save, .. }
            | Self::Color { save, .. }
            | Self::Label { save, .. } => *save = false,
            Self::Button {} | Self::Folder { .. } => {}
        }
        self
    }
}

/// Ordered children of a folder (or of the tree root).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FolderDef {
    entries: Vec<(String, NodeDef)>,
}

impl FolderDef {
    /// Empty folder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child, replacing an existing child of the same name in place.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, def: NodeDef) -> Self {
        self.insert(name.into(), def);
        self
    }

    /// Insert or replace a child. Replacement keeps the original position.
    pub fn insert(&mut self, name: String, def: NodeDef) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = def;
        } else {
            self.entries.push((name, def));
        }
    }

    /// Overlay `other` onto `self`: children of `other` replace same-named
    /// children of `self` wholesale; new names are appended.
    #[must_use]
    pub fn merged(mut self, other: FolderDef) -> Self {
        for (name, def) in other.entries {
            if self.get(&name).is_some() {
                log::warn!("[param] Application definition replaces built-in '{name}'");
            }
            self.insert(name, def);
        }
        self
    }

    /// Look up a direct child.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NodeDef> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// Children in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeDef)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the folder has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a definition from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a node is invalid.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid parameter definition")
    }

    /// Read and parse a definition file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

impl<'de> Deserialize<'de> for FolderDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FolderVisitor;

        impl<'de> Visitor<'de> for FolderVisitor {
            type Value = FolderDef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter names to definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FolderDef, A::Error> {
                let mut folder = FolderDef::new();
                while let Some((name, def)) = map.next_entry::<String, NodeDef>()? {
                    if folder.get(&name).is_some() {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate parameter name '{name}'"
                        )));
                    }
                    folder.entries.push((name, def));
                }
                Ok(folder)
            }
        }

        deserializer.deserialize_map(FolderVisitor)
    }
}
