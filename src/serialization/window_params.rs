use serde::{Deserialize, Serialize};

use crate::error::{DockError, DockResult};
use crate::ids::{DockId, WindowId, WindowKey};
use crate::window::{DockManager, FloatRect, WindowState};

/// Persisted record of one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowParams {
    pub window_type_id: String,
    pub top_left: (i32, i32),
    pub size: (u16, u16),
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: WindowState,
    pub window_id: WindowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dock_child_window_owner_id: Option<WindowId>,
    /// Id of the window's root group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_level_group_id: Option<DockId>,
}

impl WindowParams {
    pub fn capture(manager: &DockManager, window: WindowKey) -> Option<Self> {
        let record = manager.window(window)?;
        let window_id_of =
            |key: Option<WindowKey>| Some(manager.window(key?)?.window_id().clone());
        Some(Self {
            window_type_id: record.type_id().to_string(),
            top_left: (record.rect().x, record.rect().y),
            size: (record.rect().width, record.rect().height),
            title: record.title().to_string(),
            state: record.state(),
            window_id: record.window_id().clone(),
            owner_window_id: window_id_of(record.owner()),
            dock_child_window_owner_id: window_id_of(record.dock_child_owner()),
            top_level_group_id: manager.tree().dock_id(record.root()).cloned(),
        })
    }

    pub fn rect(&self) -> FloatRect {
        FloatRect::new(self.top_left.0, self.top_left.1, self.size.0, self.size.1)
    }

    /// Re-apply geometry, state, title and id to a live window. The recorded
    /// type must match the live one.
    pub fn apply_to(&self, manager: &mut DockManager, window: WindowKey) -> DockResult<()> {
        let record = manager
            .window(window)
            .ok_or_else(|| DockError::unknown_window(window))?;
        if record.type_id() != self.window_type_id {
            return Err(DockError::WindowTypeMismatch {
                window,
                live: record.type_id().to_string(),
                recorded: self.window_type_id.clone(),
            });
        }
        let current_id = record.window_id().clone();
        if current_id != self.window_id {
            let ids = manager.tree_mut().ids_mut();
            ids.claim_window_id(&self.window_id)?;
            ids.release_window_id(&current_id);
            manager.window_mut(window)?.window_id = self.window_id.clone();
        }
        manager.set_window_rect(window, self.rect())?;
        manager.set_window_title(window, self.title.clone())?;
        manager.set_window_state(window, self.state)?;
        Ok(())
    }
}
