use std::collections::BTreeMap;

use crate::constants::LAYOUT_FORMAT_VERSION;
use crate::error::{DockError, DockResult};
use crate::ids::{DockId, ItemId, NodeId, WindowId, WindowKey};
use crate::tree::{ContentHandle, DockItem, GroupKind};
use crate::window::{DockManager, WindowTemplate};

use super::{DockLayout, DockNodeShape, ShapeKind, WindowParams};

/// What the host supplies for an item id that is not live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSpec {
    /// Falls back to the recorded title when `None`.
    pub title: Option<String>,
    pub content: ContentHandle,
}

pub trait ItemLookup {
    fn resolve(&mut self, item_id: &ItemId) -> Option<ItemSpec>;
}

impl<F> ItemLookup for F
where
    F: FnMut(&ItemId) -> Option<ItemSpec>,
{
    fn resolve(&mut self, item_id: &ItemId) -> Option<ItemSpec> {
        self(item_id)
    }
}

/// Lookup that knows nothing; only live items are restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveItemsOnly;

impl ItemLookup for LiveItemsOnly {
    fn resolve(&mut self, _item_id: &ItemId) -> Option<ItemSpec> {
        None
    }
}

#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored_windows: Vec<WindowKey>,
    pub skipped_windows: Vec<(WindowId, DockError)>,
    pub skipped_items: Vec<ItemId>,
    pub warnings: Vec<String>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_windows.is_empty() && self.skipped_items.is_empty() && self.warnings.is_empty()
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

/// Recreate windows, ownership and dock subtrees from `layout`, replacing
/// the manager's current arrangement. Live items are reused by id; others
/// are resolved through `lookup`.
pub fn restore(
    manager: &mut DockManager,
    layout: &DockLayout,
    lookup: &mut impl ItemLookup,
) -> DockResult<RestoreReport> {
    if layout.version > LAYOUT_FORMAT_VERSION {
        return Err(DockError::Argument(format!(
            "layout version {} is newer than supported version {LAYOUT_FORMAT_VERSION}",
            layout.version
        )));
    }
    let mut report = RestoreReport::default();
    clear(manager)?;

    // 1 + 2: windows with geometry, state, title and id
    let main = manager.main_window();
    let main_id = manager
        .window(main)
        .map(|record| record.window_id().clone());
    let main_type = manager
        .window(main)
        .map(|record| record.type_id().to_string())
        .unwrap_or_default();
    let main_record = layout
        .windows
        .iter()
        .position(|params| Some(&params.window_id) == main_id.as_ref())
        .or_else(|| {
            layout
                .windows
                .iter()
                .position(|params| params.window_type_id == main_type)
        });

    let shapes: BTreeMap<&str, &DockNodeShape> = layout
        .groups
        .iter()
        .map(|shape| (shape.id.as_str(), shape))
        .collect();

    // the main record goes first so its root id is claimed before any
    // floating root is created
    let mut main_applied = main_record.map(|index| {
        let params = &layout.windows[index];
        let applied = params.apply_to(manager, main);
        if applied.is_ok()
            && let Some(root_id) = recorded_root_id(params, &shapes)
        {
            let root = manager.main_root();
            if let Err(err) = manager.tree_mut().set_dock_id(root, root_id.clone()) {
                report.warn(format!("root group id {root_id} rejected: {err}"));
            }
        }
        applied
    });

    let mut restored: Vec<(WindowKey, &WindowParams)> = Vec::new();
    for (index, params) in layout.windows.iter().enumerate() {
        if Some(index) == main_record {
            let Some(applied) = main_applied.take() else {
                continue;
            };
            match applied {
                Ok(()) => restored.push((main, params)),
                Err(err) => {
                    tracing::warn!(window_id = %params.window_id, error = %err, "main window params rejected");
                    report.skipped_windows.push((params.window_id.clone(), err));
                }
            }
            continue;
        }
        match restore_window(manager, params, recorded_root_id(params, &shapes), &mut report) {
            Ok(Some(window)) => restored.push((window, params)),
            Ok(None) => report.warn(format!(
                "window {} of type {:?} cannot be restored as a floating window",
                params.window_id, params.window_type_id
            )),
            Err(err) => {
                tracing::warn!(window_id = %params.window_id, error = %err, "window skipped");
                report.skipped_windows.push((params.window_id.clone(), err));
            }
        }
    }

    // 3: ownership edges against the recreated set
    let by_id: BTreeMap<WindowId, WindowKey> = restored
        .iter()
        .filter_map(|(key, _)| Some((manager.window(*key)?.window_id().clone(), *key)))
        .collect();
    for (window, params) in &restored {
        if let Some(owner_id) = &params.owner_window_id {
            match by_id.get(owner_id) {
                Some(owner) if owner != window => manager.set_owner(*window, Some(*owner))?,
                _ => report.warn(format!(
                    "owner {owner_id} of window {} is not restored; dropped",
                    params.window_id
                )),
            }
        }
        if let Some(owner_id) = &params.dock_child_window_owner_id {
            match by_id.get(owner_id) {
                Some(owner) if owner != window => {
                    manager.set_dock_child_owner(*window, Some(*owner))?
                }
                _ => report.warn(format!(
                    "dock child owner {owner_id} of window {} is not restored; dropped",
                    params.window_id
                )),
            }
        }
    }

    // 4: dock subtrees
    let mut used_shapes = Vec::new();
    for (window, params) in &restored {
        let Some(group_id) = &params.top_level_group_id else {
            continue;
        };
        let Some(shape) = shapes.get(group_id.as_str()) else {
            report.warn(format!(
                "root group {group_id} of window {} is missing",
                params.window_id
            ));
            continue;
        };
        used_shapes.push(group_id.as_str());
        rebuild_root(manager, *window, shape, lookup, &mut report)?;
    }
    for shape in &layout.groups {
        if !used_shapes.contains(&shape.id.as_str()) {
            report.warn(format!("group {} is not referenced by any window", shape.id));
        }
    }

    // floating windows left without content are closed
    for (window, params) in &restored {
        let Some(record) = manager.window(*window) else {
            continue;
        };
        if record.is_floating() && manager.tree().items_under(record.root()).is_empty() {
            report.warn(format!(
                "window {} has no restorable items; closed",
                params.window_id
            ));
            manager.close(*window)?;
        }
    }
    drop_unplaced_items(manager);

    for (window, _) in &restored {
        if manager.window(*window).is_some() {
            manager.bring_to_front(*window)?;
            report.restored_windows.push(*window);
        }
    }
    manager.sync();
    tracing::debug!(
        windows = report.restored_windows.len(),
        skipped = report.skipped_windows.len(),
        warnings = report.warnings.len(),
        "layout restored"
    );
    Ok(report)
}

/// Tear down the current arrangement. Items are detached, not destroyed, so
/// the layout can place them again.
fn clear(manager: &mut DockManager) -> DockResult<()> {
    let windows: Vec<(WindowKey, NodeId)> = manager
        .windows()
        .map(|(key, record)| (key, record.root()))
        .collect();
    for (_, root) in &windows {
        for item in manager.tree().items_under(*root) {
            manager.tree_mut().detach(item)?;
        }
    }
    manager.sync();
    let main = manager.main_window();
    for (window, _) in windows {
        if window != main && manager.window(window).is_some() {
            manager.close(window)?;
        }
    }
    let root = manager.main_root();
    let leftovers = manager.tree().children(root).to_vec();
    for child in leftovers {
        manager.tree_mut().destroy(child)?;
    }
    manager.sync();
    Ok(())
}

/// Recorded id of a window's root group, when the record holds a
/// single-child group that can take over as the window root.
fn recorded_root_id(params: &WindowParams, shapes: &BTreeMap<&str, &DockNodeShape>) -> Option<DockId> {
    let group_id = params.top_level_group_id.as_ref()?;
    let shape = shapes.get(group_id.as_str())?;
    (shape.kind == ShapeKind::Simple).then(|| DockId::new(shape.id.clone()))
}

fn restore_window(
    manager: &mut DockManager,
    params: &WindowParams,
    root_id: Option<DockId>,
    report: &mut RestoreReport,
) -> DockResult<Option<WindowKey>> {
    if !manager.types().is_floating(&params.window_type_id)? {
        return Ok(None);
    }
    let template: WindowTemplate = manager.types().instantiate(&params.window_type_id)?;
    let (window_id, kept) = manager.claim_or_generate_window_id(Some(&params.window_id));
    if !kept {
        report.warn(format!(
            "window id {} is taken; restored as {window_id}",
            params.window_id
        ));
    }
    let (window, root) = manager.open_window(
        &params.window_type_id,
        template,
        params.rect(),
        window_id,
        root_id.clone(),
        false,
    );
    if let Some(root_id) = root_id
        && manager.tree().dock_id(root) != Some(&root_id)
    {
        report.warn(format!("root group id {root_id} is taken; regenerated"));
    }
    manager.set_window_title(window, params.title.clone())?;
    manager.set_window_state(window, params.state)?;
    Ok(Some(window))
}

fn rebuild_root(
    manager: &mut DockManager,
    window: WindowKey,
    shape: &DockNodeShape,
    lookup: &mut impl ItemLookup,
    report: &mut RestoreReport,
) -> DockResult<()> {
    let Some(root) = manager.window(window).map(|record| record.root()) else {
        return Ok(());
    };
    if shape.kind != ShapeKind::Simple {
        report.warn(format!("root group {} is not a single-child group", shape.id));
    }
    let is_main = window == manager.main_window();
    let tree = manager.tree_mut();
    if !is_main {
        tree.set_stable(root, shape.is_stable)?;
        tree.set_auto_destroy(root, shape.auto_destroy)?;
    }
    // a non-simple root record keeps its content under a fresh group
    let content: Vec<&DockNodeShape> = if shape.kind == ShapeKind::Simple {
        shape.children.iter().collect()
    } else {
        vec![shape]
    };
    for (index, child) in content.into_iter().enumerate() {
        if index > 0 {
            report.warn(format!("extra child {} of root {} dropped", child.id, shape.id));
            continue;
        }
        if let Some(node) = build_node(manager, child, lookup, report) {
            manager.tree_mut().insert(root, node, None)?;
        }
    }
    Ok(())
}

fn build_node(
    manager: &mut DockManager,
    shape: &DockNodeShape,
    lookup: &mut impl ItemLookup,
    report: &mut RestoreReport,
) -> Option<NodeId> {
    let Some(kind) = shape.group_kind() else {
        return build_item(manager, shape, lookup, report);
    };
    let dock_id = DockId::new(shape.id.clone());
    let tree = manager.tree_mut();
    let group = match tree.create_group_with_id(kind, dock_id) {
        Ok(group) => group,
        Err(err) => {
            let group = tree.create_group(kind);
            report.warn(format!("group id {} rejected ({err}); regenerated", shape.id));
            group
        }
    };
    let _ = tree.set_stable(group, shape.is_stable);
    let _ = tree.set_auto_destroy(group, shape.auto_destroy);

    let mut lost = false;
    for child_shape in &shape.children {
        let Some(child) = build_node(manager, child_shape, lookup, report) else {
            lost = true;
            continue;
        };
        let tree = manager.tree_mut();
        if let Err(err) = tree.insert(group, child, None) {
            report.warn(format!(
                "{} cannot be placed under {}: {err}",
                child_shape.id, shape.id
            ));
            let _ = tree.destroy(child);
            lost = true;
        }
    }

    let tree = manager.tree_mut();
    if let Some(selected) = &shape.selected
        && let Some(item) = tree.find_item(&ItemId::new(selected.clone()))
        && tree.parent(item) == Some(group)
    {
        let _ = tree.select(group, item);
    }
    let empty = tree.number_of_children(group) == 0;
    if empty && shape.auto_destroy && !shape.is_stable {
        let _ = tree.destroy(group);
        return None;
    }
    if lost && kind != GroupKind::Tabbed && tree.number_of_children(group) == 1 && !shape.is_stable
    {
        // lost children while restoring; hoist what is left
        let only = tree.children(group)[0];
        tree.detach(only).ok()?;
        let _ = tree.destroy(group);
        return Some(only);
    }
    Some(group)
}

fn build_item(
    manager: &mut DockManager,
    shape: &DockNodeShape,
    lookup: &mut impl ItemLookup,
    report: &mut RestoreReport,
) -> Option<NodeId> {
    let item_id = ItemId::new(shape.id.clone());
    let tree = manager.tree_mut();
    if let Some(live) = tree.find_item(&item_id) {
        if tree.parent(live).is_none() {
            return Some(live);
        }
        report.warn(format!("item {item_id} appears more than once; later copy dropped"));
        return None;
    }
    let Some(spec) = lookup.resolve(&item_id) else {
        tracing::warn!(item_id = %item_id, "item not resolved; skipped");
        report.skipped_items.push(item_id);
        return None;
    };
    let title = spec
        .title
        .or_else(|| shape.title.clone())
        .unwrap_or_else(|| item_id.to_string());
    let item = DockItem::new(item_id.clone(), title).with_content(spec.content);
    match tree.create_item(item) {
        Ok(node) => Some(node),
        Err(err) => {
            report.warn(format!("item {item_id} could not be created: {err}"));
            None
        }
    }
}

/// Items that were live before the restore but have no place in the layout.
fn drop_unplaced_items(manager: &mut DockManager) {
    let tree = manager.tree();
    let placed: Vec<NodeId> = manager
        .windows()
        .flat_map(|(_, record)| tree.items_under(record.root()))
        .collect();
    let unplaced: Vec<NodeId> = tree
        .item_nodes()
        .into_iter()
        .filter(|item| !placed.contains(item))
        .collect();
    for item in unplaced {
        tracing::debug!(item = ?item, "dropping item absent from layout");
        let _ = manager.tree_mut().destroy(item);
    }
}
