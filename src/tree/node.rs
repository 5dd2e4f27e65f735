use serde::{Deserialize, Serialize};

use crate::ids::{DockId, ItemId, NodeId};
use crate::selection::SelectionPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Items shown one at a time behind a tab strip.
    Tabbed,
    /// Wrapper holding at most one child.
    Simple,
    /// Splitter stack laying its children out along one axis.
    Stack(Orientation),
}

impl GroupKind {
    pub fn label(self) -> &'static str {
        match self {
            GroupKind::Tabbed => "Tabbed",
            GroupKind::Simple => "Simple",
            GroupKind::Stack(_) => "Stack",
        }
    }
}

/// Opaque handle to the host's content for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockItem {
    pub item_id: ItemId,
    pub title: String,
    pub content: ContentHandle,
}

impl DockItem {
    pub fn new(item_id: impl Into<ItemId>, title: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            title: title.into(),
            content: ContentHandle::default(),
        }
    }

    pub fn with_content(mut self, content: ContentHandle) -> Self {
        self.content = content;
        self
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Item(DockItem),
    Group(GroupKind),
}

#[derive(Debug, Clone)]
pub struct DockNode {
    pub(crate) dock_id: DockId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) is_stable: bool,
    pub(crate) auto_destroy: bool,
    pub(crate) selection: Option<SelectionPolicy<NodeId>>,
}

impl DockNode {
    pub(crate) fn item(dock_id: DockId, item: DockItem) -> Self {
        Self {
            dock_id,
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Item(item),
            is_stable: false,
            auto_destroy: false,
            selection: None,
        }
    }

    pub(crate) fn group(dock_id: DockId, kind: GroupKind) -> Self {
        let selection = matches!(kind, GroupKind::Tabbed).then(|| {
            let mut policy = SelectionPolicy::new();
            policy.attach(&[]);
            policy
        });
        Self {
            dock_id,
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Group(kind),
            is_stable: false,
            auto_destroy: true,
            selection,
        }
    }

    pub fn dock_id(&self) -> &DockId {
        &self.dock_id
    }

    /// Back-reference to the containing group. A lookup only; parents own
    /// their children, never the other way around.
    pub fn dock_parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn number_of_children(&self) -> usize {
        self.children.len()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn group_kind(&self) -> Option<GroupKind> {
        match self.kind {
            NodeKind::Group(kind) => Some(kind),
            NodeKind::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&DockItem> {
        match &self.kind {
            NodeKind::Item(item) => Some(item),
            NodeKind::Group(_) => None,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self.kind, NodeKind::Item(_))
    }

    pub fn is_stable(&self) -> bool {
        self.is_stable
    }

    pub fn auto_destroy(&self) -> bool {
        self.auto_destroy
    }

    pub fn can_hold(&self, child: &DockNode) -> bool {
        match self.kind {
            NodeKind::Item(_) => false,
            NodeKind::Group(GroupKind::Tabbed) => child.is_item(),
            NodeKind::Group(GroupKind::Simple) | NodeKind::Group(GroupKind::Stack(_)) => true,
        }
    }

    pub(crate) fn collapses_when_empty(&self) -> bool {
        !self.is_item() && self.auto_destroy && !self.is_stable && self.children.is_empty()
    }
}
