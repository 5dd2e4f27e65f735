//! Saving and restoring a manager's windows and dock tree.
//!
//! Window records and tree shapes are stored separately and joined by the
//! root group's dock id. The text format is JSON.

mod restore;
mod shape;
mod window_params;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use restore::{ItemLookup, ItemSpec, LiveItemsOnly, RestoreReport, restore};
pub use shape::{DockNodeShape, ShapeKind};
pub use window_params::WindowParams;

use crate::constants::LAYOUT_FORMAT_VERSION;
use crate::error::DockResult;
use crate::window::DockManager;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockLayout {
    pub version: u32,
    /// Window records, back to front.
    pub windows: Vec<WindowParams>,
    /// One shape per window root.
    pub groups: Vec<DockNodeShape>,
}

impl DockLayout {
    pub fn capture(manager: &DockManager) -> Self {
        let mut windows = Vec::new();
        let mut groups = Vec::new();
        for window in manager.z_order() {
            let Some(params) = WindowParams::capture(manager, *window) else {
                continue;
            };
            if let Some(root) = manager.window(*window).map(|record| record.root())
                && let Some(shape) = DockNodeShape::capture(manager.tree(), root)
            {
                groups.push(shape);
            }
            windows.push(params);
        }
        Self {
            version: LAYOUT_FORMAT_VERSION,
            windows,
            groups,
        }
    }

    pub fn to_json(&self) -> DockResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> DockResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DockResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), "saved dock layout");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> DockResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Restore into `manager`. See [`restore`].
    pub fn restore_into(
        &self,
        manager: &mut DockManager,
        lookup: &mut impl ItemLookup,
    ) -> DockResult<RestoreReport> {
        restore(manager, self, lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DockError;
    use crate::ids::{DockId, ItemId};
    use crate::tree::{DockItem, GroupKind};
    use crate::window::{WindowState, WindowTemplate};

    fn titles(ids: &[&str]) -> impl FnMut(&ItemId) -> Option<ItemSpec> {
        let known: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        move |item_id: &ItemId| {
            known
                .iter()
                .any(|id| id == item_id.as_str())
                .then(ItemSpec::default)
        }
    }

    fn sample() -> DockManager {
        let mut manager = DockManager::default();
        let a = manager.open_item(DockItem::new("a", "Alpha")).unwrap();
        manager.open_item(DockItem::new("b", "Beta")).unwrap();
        let c = manager.open_item(DockItem::new("c", "Gamma")).unwrap();
        manager
            .dock_item(c, a, crate::host::DropZone::Right)
            .unwrap();
        let d = manager.open_item(DockItem::new("d", "Delta")).unwrap();
        let floating = manager.create_floating_window_for(d, (30, 4)).unwrap();
        manager
            .set_window_state(floating, WindowState::Maximized)
            .unwrap();
        manager
    }

    #[test]
    fn capture_then_restore_is_isomorphic() {
        let layout = DockLayout::capture(&sample());
        let mut fresh = DockManager::default();
        let report = layout
            .restore_into(&mut fresh, &mut titles(&["a", "b", "c", "d"]))
            .unwrap();
        assert!(report.is_clean(), "{report:?}");
        assert_eq!(DockLayout::capture(&fresh), layout);
        assert!(fresh.tree().invariant_violations().is_empty());
    }

    #[test]
    fn unresolved_items_are_skipped() {
        let layout = DockLayout::capture(&sample());
        let mut fresh = DockManager::default();
        let report = layout
            .restore_into(&mut fresh, &mut titles(&["a", "c"]))
            .unwrap();
        assert_eq!(
            report.skipped_items,
            vec![ItemId::new("b"), ItemId::new("d")]
        );
        // the floating window held only "d" and is gone
        assert_eq!(fresh.window_count(), 1);
        assert!(fresh.find_item(&ItemId::new("a")).is_some());
        assert!(fresh.tree().invariant_violations().is_empty());
    }

    #[test]
    fn unknown_window_type_skips_only_that_window() {
        let mut layout = DockLayout::capture(&sample());
        layout.windows[1].window_type_id = "palette".into();
        let mut fresh = DockManager::default();
        let report = layout
            .restore_into(&mut fresh, &mut titles(&["a", "b", "c", "d"]))
            .unwrap();
        assert_eq!(report.skipped_windows.len(), 1);
        assert!(matches!(
            report.skipped_windows[0].1,
            DockError::TypeResolution(_)
        ));
        assert_eq!(fresh.window_count(), 1);
        assert!(fresh.find_item(&ItemId::new("b")).is_some());
    }

    #[test]
    fn main_window_type_mismatch_is_reported() {
        let mut layout = DockLayout::capture(&sample());
        layout.windows[0].window_type_id = "floating".into();
        let mut fresh = DockManager::default();
        let report = layout
            .restore_into(&mut fresh, &mut titles(&["a", "b", "c", "d"]))
            .unwrap();
        assert!(matches!(
            report.skipped_windows[0].1,
            DockError::WindowTypeMismatch { .. }
        ));
    }

    fn rename_root(layout: &mut DockLayout, window: usize, id: &DockId) {
        let old = layout.windows[window]
            .top_level_group_id
            .replace(id.clone())
            .unwrap();
        let shape = layout
            .groups
            .iter_mut()
            .find(|shape| shape.id == old.as_str())
            .unwrap();
        shape.id = id.to_string();
    }

    #[test]
    fn recorded_root_ids_win_over_freshly_generated_ones() {
        let mut manager = sample();
        let e = manager.open_item(DockItem::new("e", "Epsilon")).unwrap();
        manager.create_floating_window_for(e, (50, 8)).unwrap();
        let mut layout = DockLayout::capture(&manager);
        assert_eq!(layout.windows.len(), 3);

        // the next two group ids a fresh manager generates
        let mut scratch = DockManager::default();
        let upcoming: Vec<DockId> = (0..2)
            .map(|_| {
                let group = scratch.create_group(GroupKind::Simple);
                scratch.tree().dock_id(group).cloned().unwrap()
            })
            .collect();
        let text = layout.to_json().unwrap();
        assert!(upcoming.iter().all(|id| !text.contains(&format!("\"{id}\""))));
        rename_root(&mut layout, 1, &upcoming[1]);
        rename_root(&mut layout, 2, &upcoming[0]);

        let mut fresh = DockManager::default();
        let report = layout
            .restore_into(&mut fresh, &mut titles(&["a", "b", "c", "d", "e"]))
            .unwrap();
        assert!(report.is_clean(), "{report:?}");
        assert_eq!(DockLayout::capture(&fresh), layout);
    }

    #[test]
    fn non_floating_types_are_not_restored_as_top_level_windows() {
        let mut layout = DockLayout::capture(&sample());
        layout.windows[1].window_type_id = "inspector".into();
        let mut fresh = DockManager::default();
        fresh.register_window_type("inspector", false, || WindowTemplate::new("Inspector"));

        let report = layout
            .restore_into(&mut fresh, &mut titles(&["a", "b", "c", "d"]))
            .unwrap();

        assert!(report.skipped_windows.is_empty(), "{report:?}");
        let window_id = layout.windows[1].window_id.to_string();
        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.contains(&window_id) && warning.contains("inspector")),
            "{report:?}"
        );
        assert_eq!(fresh.window_count(), 1);
        assert_eq!(report.restored_windows, vec![fresh.main_window()]);
        assert!(fresh.find_item(&ItemId::new("b")).is_some());
        assert!(fresh.find_item(&ItemId::new("d")).is_none());
        assert!(fresh.tree().invariant_violations().is_empty());
    }

    #[test]
    fn tabbed_root_record_is_wrapped_with_one_warning() {
        let mut layout = DockLayout::capture(&sample());
        let root_id = layout.windows[1].top_level_group_id.clone().unwrap();
        let index = layout
            .groups
            .iter()
            .position(|shape| shape.id == root_id.as_str())
            .unwrap();
        let tabbed = layout.groups[index].children[0].clone();
        layout.windows[1].top_level_group_id = Some(DockId::new(tabbed.id.clone()));
        layout.groups[index] = tabbed;

        let mut fresh = DockManager::default();
        let report = layout
            .restore_into(&mut fresh, &mut titles(&["a", "b", "c", "d"]))
            .unwrap();

        assert_eq!(report.warnings.len(), 1, "{report:?}");
        assert!(report.warnings[0].contains("not a single-child group"));
        assert_eq!(fresh.window_count(), 2);
        let d = fresh.find_item(&ItemId::new("d")).unwrap();
        assert_ne!(fresh.window_of(d), Some(fresh.main_window()));
        assert!(fresh.tree().invariant_violations().is_empty());
    }

    #[test]
    fn json_text_round_trips() {
        let layout = DockLayout::capture(&sample());
        let text = layout.to_json().unwrap();
        assert!(text.contains("\"window_type_id\": \"floating\""));
        assert_eq!(DockLayout::from_json(&text).unwrap(), layout);
    }
}
