use std::collections::BTreeMap;

use crate::config::{DockOptions, OrphanPolicy};
use crate::constants::{FLOATING_WINDOW_TYPE, MAIN_WINDOW_TYPE};
use crate::error::{DockError, DockResult, StructureError};
use crate::host::{DropZone, HostCommand, VisualHost, WindowHost, WindowSpec};
use crate::ids::{DockId, ItemId, NodeId, WindowId, WindowKey};
use crate::observer::Subscription;
use crate::tree::{DockItem, DockTree, GroupKind, NodeKind, TreeEvent};

use super::{DockWindow, FloatRect, WindowState, WindowTemplate, WindowTypeRegistry};

const MAIN_WINDOW_RECT: FloatRect = FloatRect {
    x: 0,
    y: 0,
    width: 80,
    height: 24,
};

/// Owns one dock tree and the windows presenting it.
///
/// Every edit goes through a method on the manager. Host-side effects are
/// queued as [`HostCommand`]s and replayed by [`DockManager::flush_to`].
#[derive(Debug)]
pub struct DockManager {
    tree: DockTree,
    windows: BTreeMap<WindowKey, DockWindow>,
    // back to front
    z_order: Vec<WindowKey>,
    next_window: u64,
    main: WindowKey,
    main_root: NodeId,
    types: WindowTypeRegistry,
    options: DockOptions,
    commands: Vec<HostCommand>,
}

impl Default for DockManager {
    fn default() -> Self {
        Self::new(DockOptions::default())
    }
}

impl DockManager {
    pub fn new(options: DockOptions) -> Self {
        let template = WindowTemplate {
            stable_root: true,
            ..WindowTemplate::new("main")
        };
        Self::build(options, WindowTypeRegistry::default(), template)
    }

    /// Build with a host-supplied registry. The registry must know the main
    /// window type.
    pub fn with_registry(options: DockOptions, types: WindowTypeRegistry) -> DockResult<Self> {
        let template = types.instantiate(MAIN_WINDOW_TYPE)?;
        Ok(Self::build(options, types, template))
    }

    fn build(options: DockOptions, types: WindowTypeRegistry, template: WindowTemplate) -> Self {
        let mut tree = DockTree::new();
        tree.set_auto_simplify(options.auto_simplify);
        let mut manager = Self {
            tree,
            windows: BTreeMap::new(),
            z_order: Vec::new(),
            next_window: 0,
            main: WindowKey(0),
            main_root: NodeId(0),
            types,
            options,
            commands: Vec::new(),
        };
        let window_id = manager.tree.ids_mut().generate_window_id();
        let rect = FloatRect {
            width: template.size.0.max(MAIN_WINDOW_RECT.width),
            height: template.size.1.max(MAIN_WINDOW_RECT.height),
            ..MAIN_WINDOW_RECT
        };
        let template = WindowTemplate {
            stable_root: true,
            ..template
        };
        let (main, root) =
            manager.open_window(MAIN_WINDOW_TYPE, template, rect, window_id, None, true);
        manager.main = main;
        manager.main_root = root;
        manager
    }

    pub fn options(&self) -> &DockOptions {
        &self.options
    }

    pub fn tree(&self) -> &DockTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut DockTree {
        &mut self.tree
    }

    pub fn types(&self) -> &WindowTypeRegistry {
        &self.types
    }

    pub fn register_window_type(
        &mut self,
        type_id: impl Into<String>,
        floating: bool,
        factory: impl Fn() -> WindowTemplate + 'static,
    ) {
        self.types.register(type_id, floating, factory);
    }

    pub fn main_window(&self) -> WindowKey {
        self.main
    }

    /// Root group of the main window. It is stable, so it lives as long as
    /// the manager.
    pub fn main_root(&self) -> NodeId {
        self.main_root
    }

    pub fn window(&self, window: WindowKey) -> Option<&DockWindow> {
        self.windows.get(&window)
    }

    pub(crate) fn window_mut(&mut self, window: WindowKey) -> DockResult<&mut DockWindow> {
        self.windows
            .get_mut(&window)
            .ok_or_else(|| DockError::unknown_window(window))
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowKey, &DockWindow)> {
        self.windows.iter().map(|(key, window)| (*key, window))
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Live windows back to front.
    pub fn z_order(&self) -> &[WindowKey] {
        &self.z_order
    }

    pub fn find_window(&self, window_id: &WindowId) -> Option<WindowKey> {
        self.windows()
            .find_map(|(key, window)| (window.window_id == *window_id).then_some(key))
    }

    pub fn window_with_root(&self, root: NodeId) -> Option<WindowKey> {
        self.windows()
            .find_map(|(key, window)| (window.root == root).then_some(key))
    }

    /// Window presenting `node`, if it is attached under one.
    pub fn window_of(&self, node: NodeId) -> Option<WindowKey> {
        if !self.tree.contains(node) {
            return None;
        }
        self.window_with_root(self.tree.root_of(node))
    }

    pub fn group_of(&self, item: NodeId) -> Option<NodeId> {
        self.tree.item(item)?;
        self.tree.parent(item)
    }

    pub fn find_item(&self, item_id: &ItemId) -> Option<NodeId> {
        self.tree.find_item(item_id)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TreeEvent) + 'static) -> Subscription {
        self.tree.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.tree.unsubscribe(subscription)
    }

    pub fn pending_commands(&self) -> &[HostCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Replay queued host commands in order, then let the host re-measure.
    pub fn flush_to<H: VisualHost + WindowHost + ?Sized>(&mut self, host: &mut H) {
        self.pump_visuals();
        for command in std::mem::take(&mut self.commands) {
            command.apply(host);
        }
        host.refresh(&self.tree);
    }

    fn pump_visuals(&mut self) {
        let ops = self.tree.take_visual_ops();
        self.commands.extend(ops.into_iter().map(HostCommand::Visual));
    }

    /// Forward visual edits and close windows whose root lost its last child.
    pub(crate) fn sync(&mut self) {
        self.pump_visuals();
        loop {
            let emptied = self.tree.take_emptied_roots();
            if emptied.is_empty() {
                break;
            }
            for root in emptied {
                if self.tree.number_of_children(root) > 0 {
                    continue;
                }
                if let Some(window) = self.window_with_root(root)
                    && window != self.main
                {
                    tracing::debug!(window = ?window, "closing emptied window");
                    self.close_inner(window);
                }
            }
        }
    }

    pub(crate) fn claim_or_generate_window_id(
        &mut self,
        requested: Option<&WindowId>,
    ) -> (WindowId, bool) {
        let ids = self.tree.ids_mut();
        match requested {
            Some(id) if ids.claim_window_id(id).is_ok() => (id.clone(), true),
            Some(_) => (ids.generate_window_id(), false),
            None => (ids.generate_window_id(), true),
        }
    }

    pub(crate) fn open_window(
        &mut self,
        type_id: &str,
        template: WindowTemplate,
        rect: FloatRect,
        window_id: WindowId,
        root_id: Option<DockId>,
        is_main: bool,
    ) -> (WindowKey, NodeId) {
        self.pump_visuals();
        let root = match root_id {
            Some(dock_id) => self
                .tree
                .create_group_with_id(GroupKind::Simple, dock_id)
                .unwrap_or_else(|err| {
                    tracing::debug!(error = %err, "root id taken; generating one");
                    self.tree.create_group(GroupKind::Simple)
                }),
            None => self.tree.create_group(GroupKind::Simple),
        };
        if template.stable_root {
            let _ = self.tree.set_stable(root, true);
        }
        self.next_window = self.next_window.saturating_add(1);
        let key = WindowKey(self.next_window);
        let window = DockWindow {
            window_id,
            type_id: type_id.to_string(),
            root,
            rect,
            title: template.title,
            state: WindowState::Normal,
            owner: None,
            dock_child_owner: None,
            is_main,
        };
        self.commands.push(HostCommand::CreateWindow {
            window: key,
            spec: WindowSpec {
                type_id: window.type_id.clone(),
                root,
                rect,
                title: window.title.clone(),
                state: window.state,
            },
        });
        self.commands.push(HostCommand::ShowWindow(key));
        self.windows.insert(key, window);
        self.z_order.push(key);
        tracing::debug!(window = ?key, type_id, "opened dock window");
        (key, root)
    }

    pub fn create_group(&mut self, kind: GroupKind) -> NodeId {
        self.tree.create_group(kind)
    }

    /// Create an item and insert it under `group`.
    pub fn add_item(
        &mut self,
        item: DockItem,
        group: NodeId,
        index: Option<usize>,
    ) -> DockResult<NodeId> {
        let node = self.tree.create_item(item)?;
        if let Err(err) = self.tree.insert(group, node, index) {
            let _ = self.tree.destroy(node);
            return Err(err);
        }
        self.sync();
        Ok(node)
    }

    /// Add an item to the first tabbed group of the main window, creating
    /// one when the main window is empty.
    pub fn open_item(&mut self, item: DockItem) -> DockResult<NodeId> {
        // the item is created first so a rejected id leaves the tree untouched
        let node = self.tree.create_item(item)?;
        let root = self.main_root;
        let existing = self
            .tree
            .descendants(root)
            .into_iter()
            .find(|id| self.tree.group_kind(*id) == Some(GroupKind::Tabbed));
        let placed = match existing {
            Some(group) => self.tree.insert(group, node, None),
            None => self.open_in_new_group(root, node),
        };
        if let Err(err) = placed {
            if self.tree.contains(node) {
                self.tree.destroy(node)?;
            }
            return Err(err);
        }
        self.sync();
        Ok(node)
    }

    fn open_in_new_group(&mut self, root: NodeId, node: NodeId) -> DockResult<()> {
        let group = self.tree.create_group(GroupKind::Tabbed);
        let placed = self.tree.insert(group, node, None).and_then(|()| {
            match self.tree.children(root).first().copied() {
                None => self.tree.insert(root, group, None),
                Some(anchor) => self
                    .tree
                    .split_insert(anchor, group, crate::tree::SplitSide::Right)
                    .map(|_| ()),
            }
        });
        if placed.is_err() && self.tree.contains(group) {
            self.tree.destroy(group)?;
        }
        placed
    }

    pub fn insert(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> DockResult<()> {
        self.tree.insert(parent, child, index)?;
        self.sync();
        Ok(())
    }

    pub fn detach(&mut self, node: NodeId) -> DockResult<Option<NodeId>> {
        let parent = self.tree.detach(node)?;
        self.sync();
        Ok(parent)
    }

    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> DockResult<()> {
        self.tree.remove(parent, child)?;
        self.sync();
        Ok(())
    }

    pub fn request_remove(&mut self, item: NodeId) -> DockResult<()> {
        self.tree.request_remove(item)?;
        self.sync();
        Ok(())
    }

    pub fn select(&mut self, tabbed: NodeId, item: NodeId) -> DockResult<()> {
        self.tree.select(tabbed, item)
    }

    pub fn set_item_title(&mut self, item: NodeId, title: impl Into<String>) -> DockResult<()> {
        self.tree.set_title(item, title)
    }

    /// Tear `item` out of wherever it is and present it alone in a new
    /// floating window at `at`.
    pub fn create_floating_window_for(
        &mut self,
        item: NodeId,
        at: (i32, i32),
    ) -> DockResult<WindowKey> {
        let Some(dock_item) = self.tree.item(item) else {
            return Err(DockError::Argument(format!("{item:?} is not a dock item")));
        };
        let title = dock_item.title.clone();
        let (owner, dock_child_owner) = self.floating_owners(self.window_of(item), item);
        let (width, height) = self.options.floating_size;
        let rect = FloatRect::new(at.0, at.1, width, height);
        let (window_id, _) = self.claim_or_generate_window_id(None);
        let (key, _) = self.open_window(
            FLOATING_WINDOW_TYPE,
            WindowTemplate::new(title),
            rect,
            window_id,
            None,
            false,
        );
        if let Some(window) = self.windows.get_mut(&key) {
            window.owner = owner;
            window.dock_child_owner = dock_child_owner;
        }
        let root = self.windows.get(&key).map(DockWindow::root);
        if let Some(root) = root {
            let tabbed = self.tree.create_group(GroupKind::Tabbed);
            self.tree.insert(root, tabbed, None)?;
            self.tree.move_to(item, tabbed, None)?;
        }
        self.sync();
        tracing::debug!(item = ?item, window = ?key, "floated item");
        Ok(key)
    }

    fn floating_owners(
        &self,
        source: Option<WindowKey>,
        item: NodeId,
    ) -> (Option<WindowKey>, Option<WindowKey>) {
        let Some(source_key) = source else {
            return (None, None);
        };
        let Some(window) = self.windows.get(&source_key) else {
            return (None, None);
        };
        // the source closes once the item leaves it
        if window.is_floating() && self.tree.items_under(window.root) == [item] {
            return (window.owner, window.dock_child_owner);
        }
        let owner = self.options.own_floating_windows.then_some(source_key);
        (owner, Some(source_key))
    }

    /// Tabbed group that receives a centered drop on `target`.
    fn center_target(&mut self, target: NodeId) -> DockResult<NodeId> {
        let node = self
            .tree
            .node(target)
            .ok_or_else(|| DockError::unknown_node(target))?;
        match node.kind() {
            NodeKind::Group(GroupKind::Tabbed) => Ok(target),
            NodeKind::Item(_) => match self.tree.parent(target) {
                Some(parent) if self.tree.group_kind(parent) == Some(GroupKind::Tabbed) => {
                    Ok(parent)
                }
                _ => Err(DockError::Argument(format!(
                    "{target:?} is not inside a tabbed group"
                ))),
            },
            NodeKind::Group(GroupKind::Simple) => match node.children().first().copied() {
                Some(child) => self.center_target(child),
                None => {
                    let group = self.tree.create_group(GroupKind::Tabbed);
                    self.tree.insert(target, group, None)?;
                    Ok(group)
                }
            },
            NodeKind::Group(GroupKind::Stack(_)) => Err(DockError::Argument(format!(
                "{target:?} cannot take a centered drop"
            ))),
        }
    }

    /// Dock `item` onto `target`: into its tabbed group for `Center`, as a
    /// split for an edge zone.
    pub fn dock_item(&mut self, item: NodeId, target: NodeId, zone: DropZone) -> DockResult<()> {
        if self.tree.item(item).is_none() {
            return Err(DockError::Argument(format!("{item:?} is not a dock item")));
        }
        match zone.split_side() {
            None => {
                let group = self.center_target(target)?;
                if self.tree.parent(item) != Some(group) {
                    self.tree.move_to(item, group, None)?;
                }
            }
            Some(side) => {
                self.tree.split_insert(target, item, side)?;
            }
        }
        if let Some(group) = self.tree.parent(item) {
            self.tree.select(group, item)?;
        }
        self.sync();
        Ok(())
    }

    /// Put `item` at `index` in `group`'s tab strip, reordering when it is
    /// already a member.
    pub fn dock_item_tab(&mut self, item: NodeId, group: NodeId, index: Option<usize>) -> DockResult<()> {
        if self.tree.parent(item) == Some(group) {
            let last = self.tree.number_of_children(group).saturating_sub(1);
            let index = index.unwrap_or(last).min(last);
            self.tree.reorder(group, item, index)?;
        } else {
            self.tree.move_to(item, group, index)?;
        }
        self.tree.select(group, item)?;
        self.sync();
        Ok(())
    }

    fn dockable_content(&self, window: WindowKey, target: NodeId) -> DockResult<NodeId> {
        let record = self
            .windows
            .get(&window)
            .ok_or_else(|| DockError::unknown_window(window))?;
        if record.is_main {
            return Err(DockError::Argument("the main window cannot be docked".into()));
        }
        if self.window_of(target) == Some(window) {
            return Err(StructureError::Cycle {
                parent: target,
                child: record.root,
            }
            .into());
        }
        self.tree
            .children(record.root)
            .first()
            .copied()
            .ok_or_else(|| DockError::Argument(format!("{window:?} has no content")))
    }

    /// Move a floating window's whole content onto `target`. The emptied
    /// window closes.
    pub fn dock_window(
        &mut self,
        window: WindowKey,
        target: NodeId,
        zone: DropZone,
    ) -> DockResult<()> {
        let content = self.dockable_content(window, target)?;
        match zone.split_side() {
            None => {
                let group = self.center_target(target)?;
                self.move_items_into(content, group, None)?;
            }
            Some(side) => {
                self.tree.split_insert(target, content, side)?;
            }
        }
        tracing::debug!(window = ?window, target = ?target, zone = ?zone, "docked window");
        self.sync();
        Ok(())
    }

    /// Move a floating window's items into `group`'s tab strip at `index`.
    pub fn dock_window_tab(
        &mut self,
        window: WindowKey,
        group: NodeId,
        index: Option<usize>,
    ) -> DockResult<()> {
        let content = self.dockable_content(window, group)?;
        if self.tree.group_kind(group) != Some(GroupKind::Tabbed) {
            return Err(DockError::Argument(format!("{group:?} is not a tabbed group")));
        }
        self.move_items_into(content, group, index)?;
        self.sync();
        Ok(())
    }

    fn move_items_into(
        &mut self,
        content: NodeId,
        group: NodeId,
        index: Option<usize>,
    ) -> DockResult<()> {
        let items = self.tree.items_under(content);
        let focus = if self.tree.group_kind(content) == Some(GroupKind::Tabbed) {
            self.tree.selected(content)
        } else {
            items.first().copied()
        };
        let mut at = index;
        for item in items {
            self.tree.move_to(item, group, at)?;
            at = at.map(|index| index + 1);
        }
        if let Some(focus) = focus {
            self.tree.select(group, focus)?;
        }
        Ok(())
    }

    /// Close a window and destroy the items it presents. Windows it owns are
    /// handled per [`OrphanPolicy`]. The main window cannot be closed.
    pub fn close(&mut self, window: WindowKey) -> DockResult<()> {
        if window == self.main {
            return Err(DockError::Argument("the main window cannot be closed".into()));
        }
        if !self.windows.contains_key(&window) {
            return Err(DockError::unknown_window(window));
        }
        self.close_inner(window);
        self.sync();
        Ok(())
    }

    fn close_inner(&mut self, window: WindowKey) {
        let Some(closed) = self.windows.remove(&window) else {
            return;
        };
        self.z_order.retain(|key| *key != window);
        if let Err(err) = self.tree.destroy(closed.root) {
            tracing::warn!(window = ?window, error = %err, "failed to destroy window root");
        }
        self.tree.ids_mut().release_window_id(&closed.window_id);
        self.pump_visuals();
        self.commands.push(HostCommand::CloseWindow(window));
        tracing::debug!(window = ?window, "closed dock window");

        let owned: Vec<WindowKey> = self
            .windows()
            .filter(|(_, w)| w.owner == Some(window) || w.dock_child_owner == Some(window))
            .map(|(key, _)| key)
            .collect();
        match self.options.orphan_policy {
            OrphanPolicy::Reparent => {
                for key in owned {
                    if let Some(w) = self.windows.get_mut(&key) {
                        if w.owner == Some(window) {
                            w.owner = closed.owner.filter(|owner| *owner != key);
                        }
                        if w.dock_child_owner == Some(window) {
                            w.dock_child_owner =
                                closed.dock_child_owner.filter(|owner| *owner != key);
                        }
                        tracing::debug!(window = ?key, owner = ?w.owner, "re-parented owned window");
                    }
                }
            }
            OrphanPolicy::CascadeClose => {
                for key in owned {
                    if key != self.main {
                        self.close_inner(key);
                    }
                }
            }
        }
    }

    pub fn set_owner(&mut self, window: WindowKey, owner: Option<WindowKey>) -> DockResult<()> {
        if let Some(owner) = owner
            && !self.windows.contains_key(&owner)
        {
            return Err(DockError::unknown_window(owner));
        }
        self.window_mut(window)?.owner = owner;
        Ok(())
    }

    pub fn set_dock_child_owner(
        &mut self,
        window: WindowKey,
        owner: Option<WindowKey>,
    ) -> DockResult<()> {
        if let Some(owner) = owner
            && !self.windows.contains_key(&owner)
        {
            return Err(DockError::unknown_window(owner));
        }
        self.window_mut(window)?.dock_child_owner = owner;
        Ok(())
    }

    pub fn move_window(&mut self, window: WindowKey, x: i32, y: i32) -> DockResult<()> {
        let rect = self.window_mut(window)?.rect.moved_to(x, y);
        self.set_window_rect(window, rect)
    }

    pub fn set_window_rect(&mut self, window: WindowKey, rect: FloatRect) -> DockResult<()> {
        let record = self.window_mut(window)?;
        if record.rect == rect {
            return Ok(());
        }
        record.rect = rect;
        self.commands.push(HostCommand::SetGeometry { window, rect });
        Ok(())
    }

    pub fn set_window_title(&mut self, window: WindowKey, title: impl Into<String>) -> DockResult<()> {
        let title = title.into();
        self.window_mut(window)?.title = title.clone();
        self.commands.push(HostCommand::SetTitle { window, title });
        Ok(())
    }

    pub fn set_window_state(&mut self, window: WindowKey, state: WindowState) -> DockResult<()> {
        let record = self.window_mut(window)?;
        if record.state == state {
            return Ok(());
        }
        record.state = state;
        self.commands.push(HostCommand::SetState { window, state });
        tracing::debug!(window = ?window, ?state, "window state changed");
        Ok(())
    }

    pub fn toggle_maximize(&mut self, window: WindowKey) -> DockResult<WindowState> {
        let next = self
            .windows
            .get(&window)
            .ok_or_else(|| DockError::unknown_window(window))?
            .state
            .toggled_maximize();
        self.set_window_state(window, next)?;
        self.bring_to_front(window)?;
        Ok(next)
    }

    /// The host changed a window's state on its own; record it without
    /// echoing a command back.
    pub fn on_window_state_changed(&mut self, window: WindowKey, state: WindowState) -> DockResult<()> {
        self.window_mut(window)?.state = state;
        Ok(())
    }

    pub fn bring_to_front(&mut self, window: WindowKey) -> DockResult<()> {
        if !self.windows.contains_key(&window) {
            return Err(DockError::unknown_window(window));
        }
        if self.z_order.last() == Some(&window) {
            return Ok(());
        }
        self.z_order.retain(|key| *key != window);
        self.z_order.push(window);
        self.commands.push(HostCommand::Raise(window));
        Ok(())
    }
}
