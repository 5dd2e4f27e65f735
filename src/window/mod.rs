pub mod dock_manager;
pub mod scope;

use std::collections::BTreeMap;

use ratatui::prelude::Rect;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FLOATING_SIZE, FLOATING_WINDOW_TYPE, MAIN_WINDOW_TYPE};
use crate::error::{DockError, DockResult};
use crate::ids::{NodeId, WindowId, WindowKey};

pub use dock_manager::DockManager;
pub use scope::{DockScopes, HostWindowHandle};

/// Signed floating rectangle origin with unsigned size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloatRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl FloatRect {
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x as i32, rect.y as i32, rect.width, rect.height)
    }

    pub fn moved_to(self, x: i32, y: i32) -> Self {
        Self { x, y, ..self }
    }

    /// The part of the rectangle that lies inside `bounds`.
    pub fn visible_in(&self, bounds: Rect) -> Rect {
        let left = (self.x as i64).max(bounds.x as i64);
        let top = (self.y as i64).max(bounds.y as i64);
        let right = (self.x as i64 + self.width as i64).min(bounds.x as i64 + bounds.width as i64);
        let bottom =
            (self.y as i64 + self.height as i64).min(bounds.y as i64 + bounds.height as i64);
        if right <= left || bottom <= top {
            return Rect::default();
        }
        Rect {
            x: left as u16,
            y: top as u16,
            width: (right - left) as u16,
            height: (bottom - top) as u16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    FullScreen,
}

impl WindowState {
    pub fn can_maximize(self) -> bool {
        self != WindowState::Maximized
    }

    pub fn can_restore(self) -> bool {
        matches!(self, WindowState::Maximized | WindowState::FullScreen)
    }

    /// State the maximize/restore button switches to.
    pub fn toggled_maximize(self) -> WindowState {
        if self.can_restore() {
            WindowState::Normal
        } else {
            WindowState::Maximized
        }
    }
}

/// A top-level window whose content is a dock subtree rooted at a
/// single-child group.
#[derive(Debug, Clone)]
pub struct DockWindow {
    pub(crate) window_id: WindowId,
    pub(crate) type_id: String,
    pub(crate) root: NodeId,
    pub(crate) rect: FloatRect,
    pub(crate) title: String,
    pub(crate) state: WindowState,
    pub(crate) owner: Option<WindowKey>,
    pub(crate) dock_child_owner: Option<WindowKey>,
    pub(crate) is_main: bool,
}

impl DockWindow {
    pub fn window_id(&self) -> &WindowId {
        &self.window_id
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Root group of the window's dock subtree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn rect(&self) -> FloatRect {
        self.rect
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn owner(&self) -> Option<WindowKey> {
        self.owner
    }

    pub fn dock_child_owner(&self) -> Option<WindowKey> {
        self.dock_child_owner
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    pub fn is_floating(&self) -> bool {
        !self.is_main
    }
}

/// Initial settings produced by a window factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowTemplate {
    pub title: String,
    pub size: (u16, u16),
    /// Roots of stable windows survive losing their last child.
    pub stable_root: bool,
}

impl WindowTemplate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            size: DEFAULT_FLOATING_SIZE,
            stable_root: false,
        }
    }
}

type WindowFactory = Box<dyn Fn() -> WindowTemplate>;

struct WindowType {
    floating: bool,
    factory: WindowFactory,
}

/// Persisted type id to window factory.
pub struct WindowTypeRegistry {
    types: BTreeMap<String, WindowType>,
}

impl std::fmt::Debug for WindowTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowTypeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for WindowTypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(MAIN_WINDOW_TYPE, false, || WindowTemplate {
            stable_root: true,
            ..WindowTemplate::new("main")
        });
        registry.register(FLOATING_WINDOW_TYPE, true, || WindowTemplate::new(""));
        registry
    }
}

impl WindowTypeRegistry {
    pub fn empty() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// Register a factory. `floating` marks types that may be restored as
    /// floating top-level windows.
    pub fn register(
        &mut self,
        type_id: impl Into<String>,
        floating: bool,
        factory: impl Fn() -> WindowTemplate + 'static,
    ) {
        self.types.insert(
            type_id.into(),
            WindowType {
                floating,
                factory: Box::new(factory),
            },
        );
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    pub fn is_floating(&self, type_id: &str) -> DockResult<bool> {
        self.types
            .get(type_id)
            .map(|ty| ty.floating)
            .ok_or_else(|| DockError::TypeResolution(type_id.to_string()))
    }

    pub fn instantiate(&self, type_id: &str) -> DockResult<WindowTemplate> {
        let ty = self
            .types
            .get(type_id)
            .ok_or_else(|| DockError::TypeResolution(type_id.to_string()))?;
        Ok((ty.factory)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_part_is_clipped_to_bounds() {
        let bounds = Rect::new(0, 0, 20, 10);
        let rect = FloatRect::new(-5, 8, 10, 5);
        assert_eq!(rect.visible_in(bounds), Rect::new(0, 8, 5, 2));
        assert_eq!(
            FloatRect::new(30, 0, 4, 4).visible_in(bounds),
            Rect::default()
        );
    }

    #[test]
    fn maximize_toggle_follows_window_chrome() {
        assert_eq!(WindowState::Normal.toggled_maximize(), WindowState::Maximized);
        assert_eq!(WindowState::Minimized.toggled_maximize(), WindowState::Maximized);
        assert_eq!(WindowState::Maximized.toggled_maximize(), WindowState::Normal);
        assert_eq!(WindowState::FullScreen.toggled_maximize(), WindowState::Normal);
        assert!(WindowState::FullScreen.can_maximize());
        assert!(!WindowState::Normal.can_restore());
    }

    #[test]
    fn unknown_type_fails_resolution() {
        let registry = WindowTypeRegistry::default();
        assert!(!registry.is_floating(MAIN_WINDOW_TYPE).unwrap());
        assert!(matches!(
            registry.instantiate("tool_palette"),
            Err(DockError::TypeResolution(id)) if id == "tool_palette"
        ));
    }
}
