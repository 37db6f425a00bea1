//! Parameter tree: typed, named, addressable controls.
//!
//! # Modules
//!
//! - [`value`] - Leaf values, colors and numeric bounds
//! - [`def`] - Declarative node definitions (JSON or builder)
//! - [`tree`] - Arena tree with an address index
//! - [`observer`] - Per-address change observers

pub mod def;
pub mod observer;
pub mod tree;
pub mod value;

use std::fmt;

#[doc(inline)]
pub use def::{FolderDef, NodeDef};
#[doc(inline)]
pub use observer::{Observer, ObserverTable};
#[doc(inline)]
pub use tree::{Node, NodeId, NodeKind, ParamTree};
#[doc(inline)]
pub use value::{Color, NumberRange, ParamValue};

/// Type tag of a parameter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// On/off toggle.
    Boolean,
    /// Numeric slider.
    Number,
    /// Editable text.
    String,
    /// RGB color.
    Color,
    /// Momentary trigger.
    Button,
    /// Read-only text display.
    Label,
    /// Group of child nodes.
    Folder,
}

impl Tag {
    /// Lowercase name as used in definition files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Color => "color",
            Self::Button => "button",
            Self::Label => "label",
            Self::Folder => "folder",
        }
    }

    /// Whether nodes with this tag hold a value.
    #[must_use]
    pub fn has_value(self) -> bool {
        !matches!(self, Self::Button | Self::Folder)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join a parent address and a child name into the child's address.
///
/// The root's address is the empty string, so top-level nodes become `/name`.
#[must_use]
pub fn join_address(parent: &str, name: &str) -> String {
    format!("{parent}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_address() {
        assert_eq!(join_address("", "settings"), "/settings");
        assert_eq!(join_address("/settings", "websocket"), "/settings/websocket");
    }

    #[test]
    fn test_tag_has_value() {
        assert!(Tag::Label.has_value());
        assert!(!Tag::Button.has_value());
        assert!(!Tag::Folder.has_value());
    }
}
