use std::collections::BTreeMap;

use crate::config::DockOptions;
use crate::error::{DockResult, StructureError};
use crate::ids::{ItemId, NodeId, WindowId, WindowKey};

use super::DockManager;

/// Host identity of a top-level window that owns a dock scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostWindowHandle(pub u64);

/// One [`DockManager`] per host top-level window.
///
/// Answers "which manager does this item or window belong to" without any
/// process-wide state. Closing a scope drops its manager and everything it
/// owns.
#[derive(Debug, Default)]
pub struct DockScopes {
    scopes: BTreeMap<HostWindowHandle, DockManager>,
}

impl DockScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &mut self,
        handle: HostWindowHandle,
        options: DockOptions,
    ) -> DockResult<&mut DockManager> {
        if self.scopes.contains_key(&handle) {
            return Err(StructureError::DuplicateId(format!("{handle:?}")).into());
        }
        tracing::debug!(handle = ?handle, "opened dock scope");
        Ok(self
            .scopes
            .entry(handle)
            .or_insert_with(|| DockManager::new(options)))
    }

    /// Install an already built manager, returning the one it replaces.
    pub fn insert(&mut self, handle: HostWindowHandle, manager: DockManager) -> Option<DockManager> {
        self.scopes.insert(handle, manager)
    }

    pub fn get(&self, handle: HostWindowHandle) -> Option<&DockManager> {
        self.scopes.get(&handle)
    }

    pub fn get_mut(&mut self, handle: HostWindowHandle) -> Option<&mut DockManager> {
        self.scopes.get_mut(&handle)
    }

    pub fn close(&mut self, handle: HostWindowHandle) -> Option<DockManager> {
        let manager = self.scopes.remove(&handle);
        if manager.is_some() {
            tracing::debug!(handle = ?handle, "closed dock scope");
        }
        manager
    }

    pub fn handles(&self) -> impl Iterator<Item = HostWindowHandle> + '_ {
        self.scopes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn scope_of_item(&self, item_id: &ItemId) -> Option<(HostWindowHandle, NodeId)> {
        self.scopes
            .iter()
            .find_map(|(handle, manager)| Some((*handle, manager.find_item(item_id)?)))
    }

    pub fn scope_of_window(&self, window_id: &WindowId) -> Option<(HostWindowHandle, WindowKey)> {
        self.scopes
            .iter()
            .find_map(|(handle, manager)| Some((*handle, manager.find_window(window_id)?)))
    }

    pub fn manager_of_item(&self, item_id: &ItemId) -> Option<&DockManager> {
        let (handle, _) = self.scope_of_item(item_id)?;
        self.get(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DockItem;

    #[test]
    fn items_resolve_to_their_own_scope() {
        let mut scopes = DockScopes::new();
        scopes
            .open(HostWindowHandle(1), DockOptions::default())
            .unwrap()
            .open_item(DockItem::new("left", "Left"))
            .unwrap();
        scopes
            .open(HostWindowHandle(2), DockOptions::default())
            .unwrap()
            .open_item(DockItem::new("right", "Right"))
            .unwrap();

        let (handle, node) = scopes.scope_of_item(&ItemId::new("right")).unwrap();
        assert_eq!(handle, HostWindowHandle(2));
        assert!(scopes.get(handle).unwrap().tree().item(node).is_some());
        assert!(scopes.scope_of_item(&ItemId::new("missing")).is_none());
    }

    #[test]
    fn closing_a_scope_drops_its_manager() {
        let mut scopes = DockScopes::new();
        scopes.open(HostWindowHandle(7), DockOptions::default()).unwrap();
        assert!(scopes.open(HostWindowHandle(7), DockOptions::default()).is_err());
        assert!(scopes.close(HostWindowHandle(7)).is_some());
        assert!(scopes.is_empty());
        assert!(scopes.close(HostWindowHandle(7)).is_none());
    }
}
