//! Arena-backed parameter tree with an address index.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. The
//! address → id index is built once at construction; lookups never descend
//! the tree. Node ids stay valid for the life of the tree, so controls and
//! observers keyed by id or address survive snapshot restores.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use serde_json::{Map, Value};

use super::def::{FolderDef, NodeDef};
use super::value::{Color, NumberRange, ParamValue};
use super::{join_address, Tag};

/// Stable handle to a node inside a [`ParamTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// On/off toggle.
    Boolean(bool),
    /// Numeric value with its bounds.
    Number {
        /// Current value, always within `range`.
        value: f64,
        /// Bounds and step.
        range: NumberRange,
    },
    /// Editable text.
    String(String),
    /// RGB color.
    Color(Color),
    /// Momentary trigger; holds no state.
    Button,
    /// Read-only text.
    Label(String),
    /// Children in display order.
    Folder(Vec<NodeId>),
}

impl NodeKind {
    /// Type tag of this kind.
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Boolean(_) => Tag::Boolean,
            Self::Number { .. } => Tag::Number,
            Self::String(_) => Tag::String,
            Self::Color(_) => Tag::Color,
            Self::Button => Tag::Button,
            Self::Label(_) => Tag::Label,
            Self::Folder(_) => Tag::Folder,
        }
    }
}

/// A node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    address: String,
    parent: Option<NodeId>,
    save: bool,
    kind: NodeKind,
}

impl Node {
    /// Key of this node within its parent.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slash-joined path from the root, e.g. `/settings/websocket/port`.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Parent folder, `None` for top-level nodes.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether snapshots include this leaf.
    #[must_use]
    pub fn save(&self) -> bool {
        self.save
    }

    /// Kind-specific payload.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Type tag.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.kind.tag()
    }

    /// Current value, `None` for buttons and folders.
    #[must_use]
    pub fn value(&self) -> Option<ParamValue> {
        match &self.kind {
            NodeKind::Boolean(b) => Some(ParamValue::Bool(*b)),
            NodeKind::Number { value, .. } => Some(ParamValue::Number(*value)),
            NodeKind::String(s) | NodeKind::Label(s) => Some(ParamValue::Text(s.clone())),
            NodeKind::Color(c) => Some(ParamValue::Color(*c)),
            NodeKind::Button | NodeKind::Folder(_) => None,
        }
    }

    /// Numeric bounds, for number nodes.
    #[must_use]
    pub fn range(&self) -> Option<NumberRange> {
        match &self.kind {
            NodeKind::Number { range, .. } => Some(*range),
            _ => None,
        }
    }

    /// Whether this node is part of persisted snapshots.
    fn persisted(&self) -> bool {
        self.save && self.tag().has_value()
    }
}

/// The parameter tree.
#[derive(Debug, Clone, Default)]
pub struct ParamTree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    index: HashMap<String, NodeId>,
}

impl ParamTree {
    /// Build a tree from definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is empty or contains `/`, or an address
    /// would be duplicated.
    pub fn build(def: &FolderDef) -> Result<Self> {
        let mut tree = Self::default();
        tree.roots = tree.add_children(def, None, "")?;
        Ok(tree)
    }

    fn add_children(
        &mut self,
        def: &FolderDef,
        parent: Option<NodeId>,
        parent_address: &str,
    ) -> Result<Vec<NodeId>> {
        let mut ids = Vec::with_capacity(def.len());
        for (name, child) in def.iter() {
            if name.is_empty() || name.contains('/') {
                bail!("invalid parameter name {name:?} under '{parent_address}/'");
            }
            let address = join_address(parent_address, name);
            if self.index.contains_key(&address) {
                bail!("duplicate parameter address '{address}'");
            }

            let id = NodeId(self.nodes.len());
            let (kind, save) = match child {
                NodeDef::Boolean { value, save } => (NodeKind::Boolean(*value), *save),
                NodeDef::Number { value, min, max, step, save } => {
                    let range = NumberRange { min: *min, max: *max, step: *step };
                    if let (Some(lo), Some(hi)) = (min, max) {
                        if lo > hi {
                            bail!("'{address}' has min {lo} above max {hi}");
                        }
                    }
                    (NodeKind::Number { value: range.constrain(*value), range }, *save)
                }
                NodeDef::String { value, save } => (NodeKind::String(value.clone()), *save),
                NodeDef::Color { value, save } => (NodeKind::Color(*value), *save),
                NodeDef::Button {} => (NodeKind::Button, false),
                NodeDef::Label { value, save } => (NodeKind::Label(value.clone()), *save),
                NodeDef::Folder { .. } => (NodeKind::Folder(Vec::new()), true),
            };

            self.nodes.push(Node {
                name: name.to_string(),
                address: address.clone(),
                parent,
                save,
                kind,
            });
            self.index.insert(address.clone(), id);

            if let NodeDef::Folder { value } = child {
                let children = self.add_children(value, Some(id), &address)?;
                self.nodes[id.0].kind = NodeKind::Folder(children);
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Number of nodes, folders included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Resolve an address to its node id.
    #[must_use]
    pub fn id(&self, address: &str) -> Option<NodeId> {
        self.index.get(address).copied()
    }

    /// Node by id.
    ///
    /// Ids are only produced by this tree, so indexing cannot fail for ids
    /// obtained from it.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node by address.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&Node> {
        self.id(address).map(|id| self.node(id))
    }

    /// Current value at `address`.
    #[must_use]
    pub fn value(&self, address: &str) -> Option<ParamValue> {
        self.get(address).and_then(Node::value)
    }

    /// Children of a folder (empty for leaves).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Folder(children) => children,
            _ => &[],
        }
    }

    /// Every node in display order (depth-first, pre-order) with its depth.
    #[must_use]
    pub fn walk(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, usize)> =
            self.roots.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for child in self.children(id).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }

    /// Every value-holding leaf in display order.
    pub fn leaves(&self) -> impl Iterator<Item = &Node> + '_ {
        self.walk()
            .into_iter()
            .map(|(id, _)| self.node(id))
            .filter(|n| n.tag().has_value())
    }

    /// Set the value at `address`. See [`ParamTree::set`].
    ///
    /// # Errors
    ///
    /// Returns an error for unknown addresses and values the node rejects.
    pub fn set_value(&mut self, address: &str, value: ParamValue) -> Result<ParamValue> {
        let id = self
            .id(address)
            .ok_or_else(|| anyhow!("unknown parameter address '{address}'"))?;
        self.set(id, value)
    }

    /// Coerce `value` to the node's tag, constrain numbers to their range,
    /// store it, and return what was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the node holds no value or the value cannot be
    /// coerced to its tag. The tree is unchanged on error.
    pub fn set(&mut self, id: NodeId, value: ParamValue) -> Result<ParamValue> {
        let node = &mut self.nodes[id.0];
        let coerced = value.coerce(node.tag())?;
        match (&mut node.kind, coerced) {
            (NodeKind::Boolean(slot), ParamValue::Bool(b)) => *slot = b,
            (NodeKind::Number { value, range }, ParamValue::Number(n)) => {
                *value = range.constrain(n);
            }
            (NodeKind::String(slot) | NodeKind::Label(slot), ParamValue::Text(t)) => *slot = t,
            (NodeKind::Color(slot), ParamValue::Color(c)) => *slot = c,
            (kind, other) => bail!("'{}' cannot hold {other:?} ({})", node.address, kind.tag()),
        }
        node.value()
            .ok_or_else(|| anyhow!("'{}' holds no value", node.address))
    }

    /// Serialize every persisted leaf into a nested JSON object mirroring
    /// the folder structure. Folders without persisted leaves are omitted.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        Value::Object(self.snapshot_level(&self.roots))
    }

    fn snapshot_level(&self, ids: &[NodeId]) -> Map<String, Value> {
        let mut map = Map::new();
        for id in ids {
            let node = self.node(*id);
            match &node.kind {
                NodeKind::Folder(children) => {
                    let inner = self.snapshot_level(children);
                    if !inner.is_empty() {
                        map.insert(node.name.clone(), Value::Object(inner));
                    }
                }
                _ if node.persisted() => {
                    if let Some(value) = node.value() {
                        map.insert(node.name.clone(), value.to_json());
                    }
                }
                _ => {}
            }
        }
        map
    }

    /// Apply a snapshot produced by [`ParamTree::snapshot`] onto this tree.
    ///
    /// Recurses into folders by value; node identity never changes. Unknown
    /// names, non-persisted leaves and values that fail coercion are skipped
    /// with a debug log. Returns every leaf that was written, in snapshot
    /// order, with the value stored.
    pub fn apply_snapshot(&mut self, snapshot: &Value) -> Vec<(NodeId, ParamValue)> {
        let mut applied = Vec::new();
        match snapshot {
            Value::Object(map) => self.apply_level("", map, &mut applied),
            other => log::debug!("[param] Ignoring non-object snapshot: {other}"),
        }
        applied
    }

    fn apply_level(
        &mut self,
        parent_address: &str,
        map: &Map<String, Value>,
        applied: &mut Vec<(NodeId, ParamValue)>,
    ) {
        for (name, raw) in map {
            let address = join_address(parent_address, name);
            let Some(id) = self.id(&address) else {
                log::debug!("[param] Snapshot entry for unknown address '{address}'");
                continue;
            };
            let node = self.node(id);
            let (tag, persisted) = (node.tag(), node.persisted());
            match (tag, raw) {
                (Tag::Folder, Value::Object(inner)) => self.apply_level(&address, inner, applied),
                (Tag::Folder, _) => {
                    log::debug!("[param] Snapshot entry for folder '{address}' is not an object");
                }
                _ if !persisted => {
                    log::debug!("[param] Skipping non-persisted '{address}' in snapshot");
                }
                _ => {
                    let Some(value) = ParamValue::from_json(raw) else {
                        log::debug!("[param] Snapshot value for '{address}' is not a scalar");
                        continue;
                    };
                    match self.set(id, value) {
                        Ok(stored) => applied.push((id, stored)),
                        Err(e) => log::debug!("[param] Snapshot value for '{address}': {e}"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ParamTree {
        let def = FolderDef::new()
            .with("sides", NodeDef::number(5.0).range(3.0, 12.0).step(1.0))
            .with(
                "look",
                NodeDef::folder(
                    FolderDef::new()
                        .with("tint", NodeDef::color(Color::new(255, 136, 0)))
                        .with("title", NodeDef::string("poly"))
                        .with("visible", NodeDef::boolean(true))
                        .with("spin", NodeDef::button())
                        .with("fps", NodeDef::label("0").transient()),
                ),
            );
        ParamTree::build(&def).unwrap()
    }

    #[test]
    fn test_addresses_are_indexed() {
        let tree = sample();
        assert_eq!(tree.len(), 7);
        let tint = tree.get("/look/tint").unwrap();
        assert_eq!(tint.name(), "tint");
        assert_eq!(tint.tag(), Tag::Color);
        assert_eq!(tree.node(tint.parent().unwrap()).address(), "/look");
        assert!(tree.get("/tint").is_none());
    }

    #[test]
    fn test_walk_is_preorder_with_depth() {
        let tree = sample();
        let order: Vec<(&str, usize)> = tree
            .walk()
            .into_iter()
            .map(|(id, d)| (tree.node(id).address(), d))
            .collect();
        assert_eq!(
            order,
            vec![
                ("/sides", 0),
                ("/look", 0),
                ("/look/tint", 1),
                ("/look/title", 1),
                ("/look/visible", 1),
                ("/look/spin", 1),
                ("/look/fps", 1),
            ]
        );
    }

    #[test]
    fn test_build_rejects_bad_names() {
        let def = FolderDef::new().with("a/b", NodeDef::boolean(true));
        assert!(ParamTree::build(&def).is_err());
        let def = FolderDef::new().with("", NodeDef::boolean(true));
        assert!(ParamTree::build(&def).is_err());
    }

    #[test]
    fn test_build_rejects_inverted_range() {
        let def = FolderDef::new().with("n", NodeDef::number(1.0).range(5.0, 2.0));
        assert!(ParamTree::build(&def).is_err());
    }

    #[test]
    fn test_build_constrains_initial_number() {
        let def = FolderDef::new().with("n", NodeDef::number(99.0).range(0.0, 10.0));
        let tree = ParamTree::build(&def).unwrap();
        assert_eq!(tree.value("/n"), Some(ParamValue::Number(10.0)));
    }

    #[test]
    fn test_set_value_constrains_numbers() {
        let mut tree = sample();
        let stored = tree.set_value("/sides", ParamValue::Number(40.0)).unwrap();
        assert_eq!(stored, ParamValue::Number(12.0));
        let stored = tree.set_value("/sides", ParamValue::Number(6.7)).unwrap();
        assert_eq!(stored, ParamValue::Number(7.0));
    }

    #[test]
    fn test_set_value_rejects_without_mutation() {
        let mut tree = sample();
        assert!(tree.set_value("/sides", ParamValue::Text("many".into())).is_err());
        assert_eq!(tree.value("/sides"), Some(ParamValue::Number(5.0)));
        assert!(tree.set_value("/look/spin", ParamValue::Bool(true)).is_err());
        assert!(tree.set_value("/look", ParamValue::Bool(true)).is_err());
        assert!(tree.set_value("/nope", ParamValue::Bool(true)).is_err());
    }

    #[test]
    fn test_snapshot_honors_save_flag() {
        let tree = sample();
        assert_eq!(
            tree.snapshot(),
            json!({
                "sides": 5,
                "look": { "tint": "#ff8800", "title": "poly", "visible": true }
            })
        );
    }

    #[test]
    fn test_snapshot_round_trip_every_tag() {
        let mut tree = sample();
        tree.set_value("/sides", ParamValue::Number(9.0)).unwrap();
        tree.set_value("/look/tint", ParamValue::Color(Color::new(1, 2, 3))).unwrap();
        tree.set_value("/look/title", ParamValue::Text("hex".into())).unwrap();
        tree.set_value("/look/visible", ParamValue::Bool(false)).unwrap();
        let saved = tree.snapshot();

        let mut fresh = sample();
        let applied = fresh.apply_snapshot(&saved);
        assert_eq!(applied.len(), 4);
        for leaf in tree.leaves().filter(|n| n.save()) {
            assert_eq!(fresh.value(leaf.address()), leaf.value(), "{}", leaf.address());
        }
    }

    #[test]
    fn test_apply_snapshot_keeps_identity_and_skips_junk() {
        let mut tree = sample();
        let before = tree.id("/look/title");
        let applied = tree.apply_snapshot(&json!({
            "look": { "title": "new", "fps": "999", "ghost": 1 },
            "sides": "not a number",
            "extra": { "x": 1 }
        }));
        assert_eq!(applied.len(), 1);
        assert_eq!(tree.id("/look/title"), before);
        assert_eq!(tree.value("/look/title"), Some(ParamValue::Text("new".into())));
        assert_eq!(tree.value("/look/fps"), Some(ParamValue::Text("0".into())));
        assert_eq!(tree.value("/sides"), Some(ParamValue::Number(5.0)));
    }
}
