//! The dock-group tree.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Parent links are plain ids, so
//! there are no ownership cycles; a node is owned by the arena and listed in
//! at most one parent's child vector.

pub mod events;
pub mod node;

use std::collections::BTreeMap;

pub use events::{TreeEvent, VisualOp};
pub use node::{ContentHandle, DockItem, DockNode, GroupKind, NodeKind, Orientation};

use crate::error::{DockError, DockResult, StructureError};
use crate::ids::{DockId, IdRegistry, ItemId, NodeId};
use crate::observer::{Observers, Subscription};

/// Side of a target node a split insert lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl SplitSide {
    pub fn orientation(self) -> Orientation {
        match self {
            SplitSide::Left | SplitSide::Right => Orientation::Horizontal,
            SplitSide::Top | SplitSide::Bottom => Orientation::Vertical,
        }
    }

    fn before(self) -> bool {
        matches!(self, SplitSide::Left | SplitSide::Top)
    }
}

enum SplitPlan {
    IntoEmptyRoot(NodeId),
    JoinStack {
        stack: NodeId,
        anchor: Option<NodeId>,
    },
    Wrap {
        target: NodeId,
    },
}

#[derive(Debug)]
pub struct DockTree {
    nodes: BTreeMap<NodeId, DockNode>,
    next_node: u64,
    ids: IdRegistry,
    observers: Observers<TreeEvent>,
    // drained by the manager and forwarded to the host in order
    visual_ops: Vec<VisualOp>,
    emptied_roots: Vec<NodeId>,
    auto_simplify: bool,
}

impl Default for DockTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DockTree {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_node: 0,
            ids: IdRegistry::new(),
            observers: Observers::default(),
            visual_ops: Vec::new(),
            emptied_roots: Vec::new(),
            auto_simplify: true,
        }
    }

    pub fn set_auto_simplify(&mut self, enabled: bool) {
        self.auto_simplify = enabled;
    }

    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    pub fn ids_mut(&mut self) -> &mut IdRegistry {
        &mut self.ids
    }

    fn alloc(&mut self, node: DockNode) -> NodeId {
        self.next_node = self.next_node.saturating_add(1);
        let id = NodeId(self.next_node);
        self.nodes.insert(id, node);
        id
    }

    pub fn create_item(&mut self, item: DockItem) -> DockResult<NodeId> {
        if self.find_item(&item.item_id).is_some() {
            return Err(StructureError::DuplicateId(item.item_id.to_string()).into());
        }
        let dock_id = self.ids.generate_dock_id("Item");
        let id = self.alloc(DockNode::item(dock_id, item));
        tracing::debug!(node = ?id, "created dock item");
        Ok(id)
    }

    pub fn create_group(&mut self, kind: GroupKind) -> NodeId {
        let dock_id = self.ids.generate_dock_id(kind.label());
        self.alloc(DockNode::group(dock_id, kind))
    }

    pub fn create_group_with_id(&mut self, kind: GroupKind, dock_id: DockId) -> DockResult<NodeId> {
        self.ids.claim_dock_id(&dock_id)?;
        Ok(self.alloc(DockNode::group(dock_id, kind)))
    }

    /// Re-key a node for serialization correlation.
    pub fn set_dock_id(&mut self, node: NodeId, dock_id: DockId) -> DockResult<()> {
        let current = self.node_ref(node)?.dock_id.clone();
        if current == dock_id {
            return Ok(());
        }
        self.ids.claim_dock_id(&dock_id)?;
        self.ids.release_dock_id(&current);
        self.node_mut(node)?.dock_id = dock_id;
        Ok(())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&DockNode> {
        self.nodes.get(&id)
    }

    fn node_ref(&self, id: NodeId) -> DockResult<&DockNode> {
        self.nodes.get(&id).ok_or_else(|| DockError::unknown_node(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DockResult<&mut DockNode> {
        self.nodes.get_mut(&id).ok_or_else(|| DockError::unknown_node(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn number_of_children(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn item(&self, id: NodeId) -> Option<&DockItem> {
        self.nodes.get(&id).and_then(DockNode::as_item)
    }

    pub fn group_kind(&self, id: NodeId) -> Option<GroupKind> {
        self.nodes.get(&id).and_then(DockNode::group_kind)
    }

    pub fn dock_id(&self, id: NodeId) -> Option<&DockId> {
        self.nodes.get(&id).map(DockNode::dock_id)
    }

    pub fn find_item(&self, item_id: &ItemId) -> Option<NodeId> {
        self.nodes
            .iter()
            .find_map(|(id, node)| (node.as_item()?.item_id == *item_id).then_some(*id))
    }

    pub fn find_group(&self, dock_id: &DockId) -> Option<NodeId> {
        self.nodes
            .iter()
            .find_map(|(id, node)| (!node.is_item() && node.dock_id == *dock_id).then_some(*id))
    }

    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Pre-order walk starting at (and including) `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.contains(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Every item in the arena, attached or not.
    pub fn item_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| node.is_item().then_some(*id))
            .collect()
    }

    pub fn items_under(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.item(*id).is_some())
            .collect()
    }

    pub fn selected(&self, tabbed: NodeId) -> Option<NodeId> {
        self.nodes
            .get(&tabbed)
            .and_then(|node| node.selection.as_ref())
            .and_then(|policy| policy.selected())
    }

    pub fn set_title(&mut self, item: NodeId, title: impl Into<String>) -> DockResult<()> {
        match &mut self.node_mut(item)?.kind {
            NodeKind::Item(dock_item) => {
                dock_item.title = title.into();
                Ok(())
            }
            NodeKind::Group(_) => Err(DockError::Argument(format!("{item:?} is not an item"))),
        }
    }

    pub fn set_stable(&mut self, group: NodeId, stable: bool) -> DockResult<()> {
        self.node_mut(group)?.is_stable = stable;
        Ok(())
    }

    pub fn set_auto_destroy(&mut self, group: NodeId, auto_destroy: bool) -> DockResult<()> {
        self.node_mut(group)?.auto_destroy = auto_destroy;
        Ok(())
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TreeEvent) + 'static) -> Subscription {
        self.observers.subscribe(listener)
    }

    /// Subscribe for as long as `node` lives. The listener is dropped when the
    /// node is destroyed, including by a cascade.
    pub fn subscribe_node(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&TreeEvent) + 'static,
    ) -> Subscription {
        self.observers.subscribe_scoped(node, listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.observers.unsubscribe(subscription)
    }

    pub fn listener_count(&self) -> usize {
        self.observers.len()
    }

    pub fn take_visual_ops(&mut self) -> Vec<VisualOp> {
        std::mem::take(&mut self.visual_ops)
    }

    /// Roots that lost their last child; their windows should be closed.
    pub fn take_emptied_roots(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.emptied_roots)
    }

    fn emit(&mut self, event: TreeEvent) {
        self.observers.emit(&event);
    }

    fn check_insert(
        &self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> DockResult<usize> {
        let parent_node = self.node_ref(parent)?;
        let child_node = self.node_ref(child)?;
        if let Some(existing) = child_node.parent {
            return Err(StructureError::AlreadyAttached {
                child,
                parent: existing,
            }
            .into());
        }
        self.check_target(parent, parent_node, child, child_node, index)
    }

    fn check_target(
        &self,
        parent: NodeId,
        parent_node: &DockNode,
        child: NodeId,
        child_node: &DockNode,
        index: Option<usize>,
    ) -> DockResult<usize> {
        if parent == child || self.is_ancestor(child, parent) {
            return Err(StructureError::Cycle { parent, child }.into());
        }
        if !parent_node.can_hold(child_node) {
            return Err(StructureError::InvalidChild { parent, child }.into());
        }
        if parent_node.group_kind() == Some(GroupKind::Simple) && !parent_node.children.is_empty()
        {
            return Err(StructureError::SingleChildOccupied { group: parent }.into());
        }
        let len = parent_node.children.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(StructureError::IndexOutOfRange { parent, index, len }.into());
        }
        Ok(index)
    }

    fn insert_raw(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let (count, change) = {
            let Some(node) = self.nodes.get_mut(&parent) else {
                return;
            };
            node.children.insert(index, child);
            let DockNode {
                children,
                selection,
                ..
            } = node;
            let change = selection
                .as_mut()
                .and_then(|policy| policy.on_inserted(children));
            (children.len(), change)
        };
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.visual_ops.push(VisualOp::Attach {
            parent,
            child,
            index,
        });
        self.emit(TreeEvent::ChildAdded {
            parent,
            child,
            index,
        });
        self.emit(TreeEvent::ChildCountChanged {
            group: parent,
            count,
        });
        if let Some(change) = change {
            self.emit(TreeEvent::SelectionChanged {
                group: parent,
                previous: change.previous,
                current: change.current,
            });
        }
    }

    fn detach_raw(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(child)?;
        let (index, count, change) = {
            let node = self.nodes.get_mut(&parent)?;
            let index = node.children.iter().position(|id| *id == child)?;
            node.children.remove(index);
            let DockNode {
                children,
                selection,
                ..
            } = node;
            let change = selection
                .as_mut()
                .and_then(|policy| policy.on_removed(children, child));
            (index, children.len(), change)
        };
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        self.visual_ops.push(VisualOp::Detach { parent, child });
        self.emit(TreeEvent::ChildRemoved {
            parent,
            child,
            index,
        });
        self.emit(TreeEvent::ChildCountChanged {
            group: parent,
            count,
        });
        if let Some(change) = change {
            self.emit(TreeEvent::SelectionChanged {
                group: parent,
                previous: change.previous,
                current: change.current,
            });
        }
        Some((parent, index))
    }

    pub fn insert(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> DockResult<()> {
        let index = self.check_insert(parent, child, index)?;
        self.insert_raw(parent, child, index);
        tracing::debug!(parent = ?parent, child = ?child, index, "inserted dock child");
        Ok(())
    }

    /// Replace the child of a single-child wrapper. The displaced child is
    /// returned detached; the wrapper does not collapse in between.
    pub fn set_child(&mut self, simple: NodeId, child: NodeId) -> DockResult<Option<NodeId>> {
        let node = self.node_ref(simple)?;
        if node.group_kind() != Some(GroupKind::Simple) {
            return Err(DockError::Argument(format!(
                "{simple:?} is not a single-child group"
            )));
        }
        if node.children.first() == Some(&child) {
            return Ok(None);
        }
        let child_node = self.node_ref(child)?;
        if let Some(existing) = child_node.parent {
            return Err(StructureError::AlreadyAttached {
                child,
                parent: existing,
            }
            .into());
        }
        if simple == child || self.is_ancestor(child, simple) {
            return Err(StructureError::Cycle {
                parent: simple,
                child,
            }
            .into());
        }
        let displaced = self.children(simple).first().copied();
        if let Some(old) = displaced {
            self.detach_raw(old);
        }
        self.insert_raw(simple, child, 0);
        Ok(displaced)
    }

    /// Detach `node` from its parent, if any, then collapse emptied ancestors.
    /// Returns the former parent.
    pub fn detach(&mut self, node: NodeId) -> DockResult<Option<NodeId>> {
        self.node_ref(node)?;
        let Some((parent, _)) = self.detach_raw(node) else {
            return Ok(None);
        };
        tracing::debug!(parent = ?parent, child = ?node, "detached dock child");
        self.collapse_from(parent);
        Ok(Some(parent))
    }

    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> DockResult<()> {
        self.node_ref(parent)?;
        if self.parent(child) != Some(parent) {
            return Err(StructureError::NotAChild { parent, child }.into());
        }
        self.detach(child).map(|_| ())
    }

    /// An item asks to be removed; its group drops and destroys it.
    pub fn request_remove(&mut self, item: NodeId) -> DockResult<()> {
        if self.item(item).is_none() {
            return Err(DockError::Argument(format!("{item:?} is not an item")));
        }
        self.emit(TreeEvent::RemoveRequested { item });
        self.destroy(item)
    }

    /// Remove `node` and its whole subtree from the arena.
    pub fn destroy(&mut self, node: NodeId) -> DockResult<()> {
        self.detach(node)?;
        self.destroy_subtree(node);
        Ok(())
    }

    fn destroy_subtree(&mut self, node: NodeId) {
        let children = self.children(node).to_vec();
        for child in children.into_iter().rev() {
            self.detach_raw(child);
            self.destroy_subtree(child);
        }
        if let Some(removed) = self.nodes.remove(&node) {
            self.ids.release_dock_id(&removed.dock_id);
            self.emit(TreeEvent::NodeDestroyed { node });
            self.observers.drop_scope(node);
        }
        self.emptied_roots.retain(|id| *id != node);
    }

    fn collapse_from(&mut self, start: NodeId) {
        let mut current = start;
        loop {
            let Some(node) = self.nodes.get(&current) else {
                return;
            };
            if !node.collapses_when_empty() {
                if self.auto_simplify {
                    self.simplify(current);
                }
                return;
            }
            let parent = node.parent;
            self.emit(TreeEvent::NoChildren { group: current });
            match parent {
                Some(parent) => {
                    tracing::debug!(group = ?current, parent = ?parent, "collapsing empty group");
                    self.detach_raw(current);
                    self.destroy_subtree(current);
                    current = parent;
                }
                None => {
                    if !self.emptied_roots.contains(&current) {
                        self.emptied_roots.push(current);
                    }
                    return;
                }
            }
        }
    }

    /// Hoist the only child of a non-stable `Simple` or `Stack` group into
    /// the group's place. Idempotent; returns whether anything changed.
    pub fn simplify(&mut self, group: NodeId) -> bool {
        let Some(node) = self.nodes.get(&group) else {
            return false;
        };
        let hoistable = matches!(
            node.group_kind(),
            Some(GroupKind::Simple) | Some(GroupKind::Stack(_))
        );
        if !hoistable || node.is_stable || node.children.len() != 1 {
            return false;
        }
        let Some(grandparent) = node.parent else {
            return false;
        };
        let child = node.children[0];
        let (Some(gp_node), Some(child_node)) = (self.nodes.get(&grandparent), self.nodes.get(&child))
        else {
            return false;
        };
        if !gp_node.can_hold(child_node) {
            return false;
        }
        self.detach_raw(child);
        let Some((_, index)) = self.detach_raw(group) else {
            return false;
        };
        self.insert_raw(grandparent, child, index);
        self.destroy_subtree(group);
        tracing::debug!(group = ?group, child = ?child, "simplified single-child group");
        true
    }

    /// Move `child` within its own group. Moving to the current index is a
    /// no-op and produces no events.
    pub fn reorder(&mut self, group: NodeId, child: NodeId, index: usize) -> DockResult<bool> {
        let node = self.node_ref(group)?;
        let Some(from) = node.children.iter().position(|id| *id == child) else {
            return Err(StructureError::NotAChild {
                parent: group,
                child,
            }
            .into());
        };
        let len = node.children.len();
        if index >= len {
            return Err(StructureError::IndexOutOfRange {
                parent: group,
                index,
                len,
            }
            .into());
        }
        if from == index {
            return Ok(false);
        }
        let node = self.node_mut(group)?;
        node.children.remove(from);
        node.children.insert(index, child);
        self.visual_ops.push(VisualOp::Detach {
            parent: group,
            child,
        });
        self.visual_ops.push(VisualOp::Attach {
            parent: group,
            child,
            index,
        });
        self.emit(TreeEvent::ChildRemoved {
            parent: group,
            child,
            index: from,
        });
        self.emit(TreeEvent::ChildAdded {
            parent: group,
            child,
            index,
        });
        Ok(true)
    }

    /// Move `child` under `new_parent` as one edit: validated up front, then
    /// detached and inserted, and only then is the old parent collapsed.
    pub fn move_to(
        &mut self,
        child: NodeId,
        new_parent: NodeId,
        index: Option<usize>,
    ) -> DockResult<()> {
        let old_parent = self.parent(child);
        if old_parent == Some(new_parent) {
            let last = self.number_of_children(new_parent).saturating_sub(1);
            let index = index.unwrap_or(last).min(last);
            self.reorder(new_parent, child, index)?;
            return Ok(());
        }
        let parent_node = self.node_ref(new_parent)?;
        let child_node = self.node_ref(child)?;
        let index = self.check_target(new_parent, parent_node, child, child_node, index)?;
        let old = self.detach_raw(child);
        self.insert_raw(new_parent, child, index);
        tracing::debug!(child = ?child, from = ?old_parent, to = ?new_parent, index, "moved dock child");
        if let Some((old_parent, _)) = old {
            self.collapse_from(old_parent);
        }
        Ok(())
    }

    /// Insert `child` beside `target`, splitting along `side`. Items are
    /// wrapped in a new tabbed group; returns the node that was placed.
    pub fn split_insert(
        &mut self,
        target: NodeId,
        child: NodeId,
        side: SplitSide,
    ) -> DockResult<NodeId> {
        let plan = self.plan_split(target, child, side)?;
        let orientation = side.orientation();
        let before = side.before();
        let old_parent = self.detach_raw(child).map(|(parent, _)| parent);
        let payload = if self.item(child).is_some() {
            let tabbed = self.create_group(GroupKind::Tabbed);
            self.insert_raw(tabbed, child, 0);
            tabbed
        } else {
            child
        };
        match plan {
            SplitPlan::IntoEmptyRoot(root) => self.insert_raw(root, payload, 0),
            SplitPlan::JoinStack { stack, anchor } => {
                let len = self.number_of_children(stack);
                let index = match anchor {
                    Some(anchor) => {
                        let at = self
                            .children(stack)
                            .iter()
                            .position(|id| *id == anchor)
                            .unwrap_or(len);
                        if before { at } else { (at + 1).min(len) }
                    }
                    None if before => 0,
                    None => len,
                };
                self.insert_raw(stack, payload, index);
            }
            SplitPlan::Wrap { target } => {
                let stack = self.create_group(GroupKind::Stack(orientation));
                if let Some((parent, index)) = self.detach_raw(target) {
                    self.insert_raw(parent, stack, index);
                }
                if before {
                    self.insert_raw(stack, payload, 0);
                    self.insert_raw(stack, target, 1);
                } else {
                    self.insert_raw(stack, target, 0);
                    self.insert_raw(stack, payload, 1);
                }
            }
        }
        tracing::debug!(target = ?target, child = ?child, side = ?side, "split insert");
        if let Some(old_parent) = old_parent {
            self.collapse_from(old_parent);
        }
        Ok(payload)
    }

    fn plan_split(&self, target: NodeId, child: NodeId, side: SplitSide) -> DockResult<SplitPlan> {
        let mut target = target;
        let target_node = self.node_ref(target)?;
        self.node_ref(child)?;
        if target_node.is_item()
            && let Some(parent) = target_node.parent
            && self.group_kind(parent) == Some(GroupKind::Tabbed)
        {
            target = parent;
        }
        if self.group_kind(target) == Some(GroupKind::Simple) && self.parent(target).is_none() {
            match self.children(target).first() {
                Some(inner) => target = *inner,
                None => return Ok(SplitPlan::IntoEmptyRoot(target)),
            }
        }
        if target == child || self.is_ancestor(child, target) {
            return Err(StructureError::Cycle {
                parent: target,
                child,
            }
            .into());
        }
        // splitting a group with only the dragged child would empty it first
        if self.parent(child) == Some(target) && self.number_of_children(target) == 1 {
            return Err(StructureError::InvalidChild {
                parent: target,
                child,
            }
            .into());
        }
        let orientation = side.orientation();
        let Some(parent) = self.parent(target) else {
            if self.group_kind(target) == Some(GroupKind::Stack(orientation)) {
                return Ok(SplitPlan::JoinStack {
                    stack: target,
                    anchor: None,
                });
            }
            return Err(StructureError::InvalidChild {
                parent: target,
                child,
            }
            .into());
        };
        if self.group_kind(parent) == Some(GroupKind::Stack(orientation)) {
            return Ok(SplitPlan::JoinStack {
                stack: parent,
                anchor: Some(target),
            });
        }
        Ok(SplitPlan::Wrap { target })
    }

    pub fn select(&mut self, tabbed: NodeId, item: NodeId) -> DockResult<()> {
        let node = self.node_mut(tabbed)?;
        let DockNode {
            children,
            selection,
            ..
        } = node;
        let Some(policy) = selection.as_mut() else {
            return Err(DockError::Argument(format!("{tabbed:?} is not a tabbed group")));
        };
        let result = policy.select(children, item);
        match result {
            Ok(Some(change)) => {
                self.emit(TreeEvent::SelectionChanged {
                    group: tabbed,
                    previous: change.previous,
                    current: change.current,
                });
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(item) => Err(DockError::InvalidSelection {
                group: tabbed,
                item,
            }),
        }
    }

    /// Structural invariants that must hold after every public operation.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (id, node) in &self.nodes {
            for child in &node.children {
                match self.nodes.get(child) {
                    Some(child_node) if child_node.parent == Some(*id) => {}
                    Some(_) => issues.push(format!("{child:?} listed by {id:?} but parented elsewhere")),
                    None => issues.push(format!("{id:?} lists missing child {child:?}")),
                }
            }
            if let Some(parent) = node.parent {
                let listed = self
                    .nodes
                    .get(&parent)
                    .map(|p| p.children.iter().filter(|c| **c == *id).count())
                    .unwrap_or(0);
                if listed != 1 {
                    issues.push(format!("{id:?} appears {listed} times under {parent:?}"));
                }
            }
            if node.group_kind() == Some(GroupKind::Simple) && node.children.len() > 1 {
                issues.push(format!("single-child group {id:?} holds {}", node.children.len()));
            }
            if let Some(policy) = &node.selection {
                let selected = policy.selected();
                match (node.children.is_empty(), selected) {
                    (true, None) => {}
                    (false, Some(item)) if node.children.contains(&item) => {}
                    _ => issues.push(format!("tabbed {id:?} has selection {selected:?}")),
                }
            }
            if node.collapses_when_empty() && node.parent.is_some() {
                issues.push(format!("empty group {id:?} survived under its parent"));
            }
            if self.is_ancestor(*id, *id) {
                issues.push(format!("{id:?} is its own ancestor"));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tree_with_tabs(titles: &[&str]) -> (DockTree, NodeId, Vec<NodeId>) {
        let mut tree = DockTree::new();
        let tabbed = tree.create_group(GroupKind::Tabbed);
        let items = titles
            .iter()
            .map(|title| {
                let item = tree.create_item(DockItem::new(*title, *title)).unwrap();
                tree.insert(tabbed, item, None).unwrap();
                item
            })
            .collect();
        (tree, tabbed, items)
    }

    #[test]
    fn insert_rejects_attached_child() {
        let (mut tree, tabbed, items) = tree_with_tabs(&["a"]);
        let other = tree.create_group(GroupKind::Tabbed);
        let err = tree.insert(other, items[0], None).unwrap_err();
        assert!(matches!(
            err,
            DockError::Structure(StructureError::AlreadyAttached { parent, .. }) if parent == tabbed
        ));
        assert_eq!(tree.number_of_children(other), 0);
    }

    #[test]
    fn simple_group_holds_one_child() {
        let mut tree = DockTree::new();
        let simple = tree.create_group(GroupKind::Simple);
        let a = tree.create_group(GroupKind::Tabbed);
        let b = tree.create_group(GroupKind::Tabbed);
        tree.insert(simple, a, None).unwrap();
        assert!(matches!(
            tree.insert(simple, b, None),
            Err(DockError::Structure(StructureError::SingleChildOccupied { .. }))
        ));
        assert_eq!(tree.set_child(simple, b).unwrap(), Some(a));
        assert_eq!(tree.children(simple), &[b]);
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn tabbed_group_only_takes_items() {
        let mut tree = DockTree::new();
        let tabbed = tree.create_group(GroupKind::Tabbed);
        let stack = tree.create_group(GroupKind::Stack(Orientation::Horizontal));
        assert!(matches!(
            tree.insert(tabbed, stack, None),
            Err(DockError::Structure(StructureError::InvalidChild { .. }))
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = DockTree::new();
        let outer = tree.create_group(GroupKind::Stack(Orientation::Vertical));
        let inner = tree.create_group(GroupKind::Stack(Orientation::Horizontal));
        tree.insert(outer, inner, None).unwrap();
        assert!(matches!(
            tree.insert(inner, outer, None),
            Err(DockError::Structure(StructureError::Cycle { .. }))
        ));
    }

    #[test]
    fn removing_selected_selects_first_remaining() {
        let (mut tree, tabbed, items) = tree_with_tabs(&["A", "B", "C"]);
        tree.select(tabbed, items[1]).unwrap();
        tree.remove(tabbed, items[1]).unwrap();
        assert_eq!(tree.children(tabbed), &[items[0], items[2]]);
        assert_eq!(tree.selected(tabbed), Some(items[0]));
    }

    #[test]
    fn empty_groups_collapse_up_to_stable_ancestor() {
        let mut tree = DockTree::new();
        let root = tree.create_group(GroupKind::Simple);
        tree.set_stable(root, true).unwrap();
        let stack = tree.create_group(GroupKind::Stack(Orientation::Horizontal));
        let tabbed = tree.create_group(GroupKind::Tabbed);
        let item = tree.create_item(DockItem::new("a", "A")).unwrap();
        tree.insert(root, stack, None).unwrap();
        tree.insert(stack, tabbed, None).unwrap();
        tree.insert(tabbed, item, None).unwrap();

        tree.detach(item).unwrap();
        assert!(!tree.contains(tabbed));
        assert!(!tree.contains(stack));
        assert!(tree.contains(root));
        assert_eq!(tree.number_of_children(root), 0);
        assert!(tree.take_emptied_roots().is_empty());
        assert!(tree.contains(item));
    }

    #[test]
    fn unstable_root_is_reported_when_emptied() {
        let mut tree = DockTree::new();
        let root = tree.create_group(GroupKind::Simple);
        let tabbed = tree.create_group(GroupKind::Tabbed);
        let item = tree.create_item(DockItem::new("a", "A")).unwrap();
        tree.insert(root, tabbed, None).unwrap();
        tree.insert(tabbed, item, None).unwrap();
        tree.detach(item).unwrap();
        assert_eq!(tree.take_emptied_roots(), vec![root]);
    }

    #[test]
    fn visual_ops_follow_logical_order() {
        let (mut tree, tabbed, items) = tree_with_tabs(&["A", "B"]);
        let ops = tree.take_visual_ops();
        assert_eq!(
            ops,
            vec![
                VisualOp::Attach {
                    parent: tabbed,
                    child: items[0],
                    index: 0
                },
                VisualOp::Attach {
                    parent: tabbed,
                    child: items[1],
                    index: 1
                },
            ]
        );
        assert!(tree.reorder(tabbed, items[1], 0).unwrap());
        assert!(!tree.reorder(tabbed, items[1], 0).unwrap());
        assert_eq!(tree.take_visual_ops().len(), 2);
    }

    #[test]
    fn split_wraps_target_in_stack() {
        let mut tree = DockTree::new();
        let root = tree.create_group(GroupKind::Simple);
        tree.set_stable(root, true).unwrap();
        let tabbed = tree.create_group(GroupKind::Tabbed);
        tree.insert(root, tabbed, None).unwrap();
        let a = tree.create_item(DockItem::new("a", "A")).unwrap();
        let b = tree.create_item(DockItem::new("b", "B")).unwrap();
        tree.insert(tabbed, a, None).unwrap();
        tree.insert(tabbed, b, None).unwrap();

        let placed = tree.split_insert(a, b, SplitSide::Right).unwrap();
        let stack = tree.children(root)[0];
        assert_eq!(
            tree.group_kind(stack),
            Some(GroupKind::Stack(Orientation::Horizontal))
        );
        assert_eq!(tree.children(stack), &[tabbed, placed]);
        assert_eq!(tree.children(placed), &[b]);
        assert_eq!(tree.children(tabbed), &[a]);
        assert!(tree.invariant_violations().is_empty());
    }

    #[test]
    fn split_with_own_single_child_is_rejected() {
        let (mut tree, tabbed, items) = tree_with_tabs(&["A"]);
        let root = tree.create_group(GroupKind::Simple);
        tree.insert(root, tabbed, None).unwrap();
        assert!(tree.split_insert(tabbed, items[0], SplitSide::Left).is_err());
        assert_eq!(tree.children(tabbed), &[items[0]]);
    }

    #[test]
    fn stack_with_one_child_is_hoisted() {
        let mut tree = DockTree::new();
        let root = tree.create_group(GroupKind::Simple);
        tree.set_stable(root, true).unwrap();
        let stack = tree.create_group(GroupKind::Stack(Orientation::Horizontal));
        let left = tree.create_group(GroupKind::Tabbed);
        let right = tree.create_group(GroupKind::Tabbed);
        let a = tree.create_item(DockItem::new("a", "A")).unwrap();
        let b = tree.create_item(DockItem::new("b", "B")).unwrap();
        tree.insert(root, stack, None).unwrap();
        tree.insert(stack, left, None).unwrap();
        tree.insert(stack, right, None).unwrap();
        tree.insert(left, a, None).unwrap();
        tree.insert(right, b, None).unwrap();

        tree.detach(b).unwrap();
        assert!(!tree.contains(right));
        assert!(!tree.contains(stack));
        assert_eq!(tree.children(root), &[left]);
        assert_eq!(tree.children(left), &[a]);
        assert!(!tree.simplify(left));
    }

    #[test]
    fn node_scoped_listeners_are_dropped_on_cascade() {
        let mut tree = DockTree::new();
        let root = tree.create_group(GroupKind::Simple);
        tree.set_stable(root, true).unwrap();
        let tabbed = tree.create_group(GroupKind::Tabbed);
        let item = tree.create_item(DockItem::new("a", "A")).unwrap();
        tree.insert(root, tabbed, None).unwrap();
        tree.insert(tabbed, item, None).unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        tree.subscribe_node(tabbed, move |event| sink.borrow_mut().push(*event));
        assert_eq!(tree.listener_count(), 1);
        tree.detach(item).unwrap();
        assert_eq!(tree.listener_count(), 0);
        assert!(events
            .borrow()
            .contains(&TreeEvent::NoChildren { group: tabbed }));
        assert!(events
            .borrow()
            .contains(&TreeEvent::NodeDestroyed { node: tabbed }));
    }

    #[test]
    fn request_remove_destroys_item() {
        let (mut tree, tabbed, items) = tree_with_tabs(&["A", "B"]);
        tree.request_remove(items[0]).unwrap();
        assert!(!tree.contains(items[0]));
        assert_eq!(tree.children(tabbed), &[items[1]]);
    }

    #[test]
    fn duplicate_item_ids_are_rejected() {
        let (mut tree, _, _) = tree_with_tabs(&["A"]);
        assert!(tree.create_item(DockItem::new("A", "again")).is_err());
    }
}
