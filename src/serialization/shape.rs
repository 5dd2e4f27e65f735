use serde::{Deserialize, Serialize};

use crate::ids::NodeId;
use crate::tree::{DockTree, GroupKind, NodeKind, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Item,
    Tabbed,
    Simple,
    Stack,
}

fn default_true() -> bool {
    true
}

/// Nested record of one dock node. Leaves carry the item id; groups carry
/// their dock id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockNodeShape {
    pub kind: ShapeKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub is_stable: bool,
    #[serde(default = "default_true")]
    pub auto_destroy: bool,
    /// Item id of the selected tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DockNodeShape>,
}

impl DockNodeShape {
    pub fn capture(tree: &DockTree, node: NodeId) -> Option<Self> {
        let dock_node = tree.node(node)?;
        let children = dock_node
            .children()
            .iter()
            .filter_map(|child| Self::capture(tree, *child))
            .collect();
        let shape = match dock_node.kind() {
            NodeKind::Item(item) => Self {
                kind: ShapeKind::Item,
                id: item.item_id.to_string(),
                title: Some(item.title.clone()),
                orientation: None,
                is_stable: false,
                auto_destroy: false,
                selected: None,
                children: Vec::new(),
            },
            NodeKind::Group(kind) => {
                let (shape_kind, orientation) = match kind {
                    GroupKind::Tabbed => (ShapeKind::Tabbed, None),
                    GroupKind::Simple => (ShapeKind::Simple, None),
                    GroupKind::Stack(orientation) => (ShapeKind::Stack, Some(*orientation)),
                };
                Self {
                    kind: shape_kind,
                    id: dock_node.dock_id().to_string(),
                    title: None,
                    orientation,
                    is_stable: dock_node.is_stable(),
                    auto_destroy: dock_node.auto_destroy(),
                    selected: tree
                        .selected(node)
                        .and_then(|item| tree.item(item))
                        .map(|item| item.item_id.to_string()),
                    children,
                }
            }
        };
        Some(shape)
    }

    pub fn group_kind(&self) -> Option<GroupKind> {
        match self.kind {
            ShapeKind::Item => None,
            ShapeKind::Tabbed => Some(GroupKind::Tabbed),
            ShapeKind::Simple => Some(GroupKind::Simple),
            ShapeKind::Stack => Some(GroupKind::Stack(
                self.orientation.unwrap_or(Orientation::Horizontal),
            )),
        }
    }

    /// Item ids of every leaf, in order.
    pub fn item_ids(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_items(&mut out);
        out
    }

    fn collect_items<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.kind == ShapeKind::Item {
            out.push(&self.id);
        }
        for child in &self.children {
            child.collect_items(out);
        }
    }
}
