//! Control binder: one control per tree node.
//!
//! Controls hold presentation state only (kind, collapse, flash). Values are
//! always read from the [`ParamTree`], so a control can never disagree with
//! the tree it was bound from.

use std::collections::HashMap;
use std::time::Instant;

use crate::param::{NodeId, NodeKind, NumberRange, ParamTree};

/// How a node is presented and edited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    /// Collapsible folder.
    Group,
    /// Boolean toggle.
    Toggle,
    /// Bounded numeric slider.
    Slider {
        /// Bounds and step of the number.
        range: NumberRange,
    },
    /// Hex color entry.
    ColorPicker,
    /// Free text entry.
    TextField,
    /// Read-only live text.
    Display,
    /// Momentary button.
    Trigger,
}

impl ControlKind {
    /// Whether the user can change the value through this control.
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Toggle | Self::Slider { .. } | Self::ColorPicker | Self::TextField)
    }
}

/// A bound control.
#[derive(Debug, Clone)]
pub struct Control {
    /// Node this control presents.
    pub id: NodeId,
    /// Address of the node.
    pub address: String,
    /// Display name.
    pub label: String,
    /// Nesting depth, 0 for top-level nodes.
    pub depth: usize,
    /// Presentation.
    pub kind: ControlKind,
    /// Group state; always false for leaves.
    pub collapsed: bool,
    /// Button press feedback ends at this instant.
    pub flash_until: Option<Instant>,
    /// Remote-change highlight ends at this instant.
    pub highlight_until: Option<Instant>,
}

impl Control {
    /// Whether the press flash is showing at `now`.
    #[must_use]
    pub fn is_flashing(&self, now: Instant) -> bool {
        self.flash_until.is_some_and(|until| now < until)
    }

    /// Whether the remote-change highlight is showing at `now`.
    #[must_use]
    pub fn is_highlighted(&self, now: Instant) -> bool {
        self.highlight_until.is_some_and(|until| now < until)
    }

    /// Slider value after moving `steps` nudges from `current`.
    ///
    /// `None` for non-slider controls.
    #[must_use]
    pub fn nudged(&self, current: f64, steps: i32) -> Option<f64> {
        match self.kind {
            ControlKind::Slider { range } => {
                Some(range.constrain(current + f64::from(steps) * range.nudge_step()))
            }
            _ => None,
        }
    }
}

/// Every control of a tree, in display order, indexed by address.
#[derive(Debug, Clone, Default)]
pub struct ControlSet {
    controls: Vec<Control>,
    by_address: HashMap<String, usize>,
}

impl ControlSet {
    /// Bind every node of `tree`. Groups start collapsed.
    #[must_use]
    pub fn bind(tree: &ParamTree) -> Self {
        let mut set = Self::default();
        for (id, depth) in tree.walk() {
            let node = tree.node(id);
            let kind = match node.kind() {
                NodeKind::Boolean(_) => ControlKind::Toggle,
                NodeKind::Number { range, .. } => ControlKind::Slider { range: *range },
                NodeKind::String(_) => ControlKind::TextField,
                NodeKind::Color(_) => ControlKind::ColorPicker,
                NodeKind::Button => ControlKind::Trigger,
                NodeKind::Label(_) => ControlKind::Display,
                NodeKind::Folder(_) => ControlKind::Group,
            };
            set.by_address.insert(node.address().to_string(), set.controls.len());
            set.controls.push(Control {
                id,
                address: node.address().to_string(),
                label: node.name().to_string(),
                depth,
                kind,
                collapsed: kind == ControlKind::Group,
                flash_until: None,
                highlight_until: None,
            });
        }
        log::debug!("[binder] Bound {} controls", set.controls.len());
        set
    }

    /// Number of controls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Whether there are no controls.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// All controls in display order.
    #[must_use]
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Control at `index` of [`ControlSet::controls`].
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Control> {
        self.controls.get(index)
    }

    /// Control registered for `address`.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&Control> {
        self.by_address.get(address).map(|i| &self.controls[*i])
    }

    fn get_mut(&mut self, address: &str) -> Option<&mut Control> {
        self.by_address.get(address).map(|i| &mut self.controls[*i])
    }

    /// Indices of the controls not hidden inside a collapsed group.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<usize> {
        let mut rows = Vec::with_capacity(self.controls.len());
        let mut hidden_below: Option<usize> = None;
        for (index, control) in self.controls.iter().enumerate() {
            if let Some(depth) = hidden_below {
                if control.depth > depth {
                    continue;
                }
                hidden_below = None;
            }
            rows.push(index);
            if control.kind == ControlKind::Group && control.collapsed {
                hidden_below = Some(control.depth);
            }
        }
        rows
    }

    /// Collapse or expand a group. Returns false if `address` is not a group.
    pub fn toggle_group(&mut self, address: &str) -> bool {
        match self.get_mut(address) {
            Some(control) if control.kind == ControlKind::Group => {
                control.collapsed = !control.collapsed;
                true
            }
            _ => false,
        }
    }

    /// Expand every group that contains `address`, so its control is visible.
    pub fn reveal(&mut self, tree: &ParamTree, address: &str) {
        let mut parent = tree.get(address).and_then(|node| node.parent());
        while let Some(id) = parent {
            let node = tree.node(id);
            if let Some(control) = self.get_mut(node.address()) {
                control.collapsed = false;
            }
            parent = node.parent();
        }
    }

    /// Show press feedback on a button until `until`.
    pub fn flash(&mut self, address: &str, until: Instant) {
        if let Some(control) = self.get_mut(address) {
            control.flash_until = Some(until);
        }
    }

    /// Highlight a control changed by the peer until `until`.
    pub fn mark_changed(&mut self, address: &str, until: Instant) {
        if let Some(control) = self.get_mut(address) {
            control.highlight_until = Some(until);
        }
    }

    /// Earliest pending flash or highlight expiry after `now`, for redraw
    /// scheduling.
    #[must_use]
    pub fn next_expiry(&self, now: Instant) -> Option<Instant> {
        self.controls
            .iter()
            .flat_map(|c| [c.flash_until, c.highlight_until])
            .flatten()
            .filter(|until| *until > now)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Color, FolderDef, NodeDef};
    use std::time::Duration;

    fn tree() -> ParamTree {
        ParamTree::build(
            &FolderDef::new()
                .with("sides", NodeDef::number(5.0).range(3.0, 12.0).step(1.0))
                .with(
                    "look",
                    NodeDef::folder(
                        FolderDef::new()
                            .with("tint", NodeDef::color(Color::new(0, 0, 0)))
                            .with("inner", NodeDef::folder(FolderDef::new().with("on", NodeDef::boolean(true))))
                            .with("title", NodeDef::string("x")),
                    ),
                )
                .with("go", NodeDef::button())
                .with("fps", NodeDef::label("0")),
        )
        .unwrap()
    }

    #[test]
    fn test_bind_kinds() {
        let set = ControlSet::bind(&tree());
        assert_eq!(set.len(), 8);
        assert!(matches!(set.get("/sides").unwrap().kind, ControlKind::Slider { .. }));
        assert_eq!(set.get("/look").unwrap().kind, ControlKind::Group);
        assert_eq!(set.get("/look/tint").unwrap().kind, ControlKind::ColorPicker);
        assert_eq!(set.get("/look/inner/on").unwrap().kind, ControlKind::Toggle);
        assert_eq!(set.get("/look/title").unwrap().kind, ControlKind::TextField);
        assert_eq!(set.get("/go").unwrap().kind, ControlKind::Trigger);
        assert_eq!(set.get("/fps").unwrap().kind, ControlKind::Display);
        assert_eq!(set.get("/look/inner/on").unwrap().depth, 2);
        assert!(!ControlKind::Display.is_editable());
    }

    #[test]
    fn test_groups_start_collapsed() {
        let set = ControlSet::bind(&tree());
        let rows: Vec<&str> = set
            .visible_rows()
            .into_iter()
            .map(|i| set.controls()[i].address.as_str())
            .collect();
        assert_eq!(rows, vec!["/sides", "/look", "/go", "/fps"]);
    }

    #[test]
    fn test_toggle_group_reveals_children_but_not_nested() {
        let mut set = ControlSet::bind(&tree());
        assert!(set.toggle_group("/look"));
        assert!(!set.toggle_group("/sides"));
        let rows: Vec<&str> = set
            .visible_rows()
            .into_iter()
            .map(|i| set.controls()[i].address.as_str())
            .collect();
        assert_eq!(
            rows,
            vec!["/sides", "/look", "/look/tint", "/look/inner", "/look/title", "/go", "/fps"]
        );
    }

    #[test]
    fn test_reveal_expands_ancestors() {
        let tree = tree();
        let mut set = ControlSet::bind(&tree);
        set.reveal(&tree, "/look/inner/on");
        let visible = set.visible_rows();
        let index = set.controls().iter().position(|c| c.address == "/look/inner/on").unwrap();
        assert!(visible.contains(&index));
    }

    #[test]
    fn test_slider_nudge() {
        let set = ControlSet::bind(&tree());
        let sides = set.get("/sides").unwrap();
        assert_eq!(sides.nudged(5.0, 1), Some(6.0));
        assert_eq!(sides.nudged(5.0, -10), Some(3.0));
        assert_eq!(set.get("/fps").unwrap().nudged(1.0, 1), None);
    }

    #[test]
    fn test_flash_expires() {
        let mut set = ControlSet::bind(&tree());
        let now = Instant::now();
        set.flash("/go", now + Duration::from_millis(100));
        let go = set.get("/go").unwrap();
        assert!(go.is_flashing(now));
        assert!(!go.is_flashing(now + Duration::from_millis(150)));
        assert_eq!(set.next_expiry(now), Some(now + Duration::from_millis(100)));
    }
}
