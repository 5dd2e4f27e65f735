use std::collections::BTreeMap;

use ratatui::prelude::Rect;

use super::{HitTarget, HitTester, PointerCapture, Surface, VisualHost, WindowHost, WindowSpec};
use crate::ids::{NodeId, WindowKey};
use crate::layout::{RegionMap, WindowLayout, layout_window};
use crate::tree::DockTree;
use crate::window::{FloatRect, WindowState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorWindow {
    pub type_id: String,
    pub root: NodeId,
    pub rect: FloatRect,
    pub title: String,
    pub state: WindowState,
    pub visible: bool,
}

/// In-memory host that mirrors everything the engine asks for.
///
/// It keeps a presentation copy of the child lists, a window table with a
/// z-order, and a cell layout per window computed on every refresh. The
/// terminal demo draws from it; tests assert against it.
#[derive(Debug, Clone)]
pub struct MirrorHost {
    viewport: Rect,
    visual_children: BTreeMap<NodeId, Vec<NodeId>>,
    windows: BTreeMap<WindowKey, MirrorWindow>,
    z_order: Vec<WindowKey>,
    frames: RegionMap<WindowKey>,
    layouts: BTreeMap<WindowKey, WindowLayout>,
    capture: Option<Surface>,
}

impl MirrorHost {
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            visual_children: BTreeMap::new(),
            windows: BTreeMap::new(),
            z_order: Vec::new(),
            frames: RegionMap::default(),
            layouts: BTreeMap::new(),
            capture: None,
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn visual_children(&self, parent: NodeId) -> &[NodeId] {
        self.visual_children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn window(&self, window: WindowKey) -> Option<&MirrorWindow> {
        self.windows.get(&window)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Windows back to front.
    pub fn z_order(&self) -> &[WindowKey] {
        &self.z_order
    }

    pub fn layout(&self, window: WindowKey) -> Option<&WindowLayout> {
        self.layouts.get(&window)
    }

    /// Topmost visible window under the point.
    pub fn window_at(&self, column: u16, row: u16) -> Option<WindowKey> {
        let front_to_back: Vec<WindowKey> = self.z_order.iter().rev().copied().collect();
        self.frames.hit_test(column, row, &front_to_back)
    }

    fn frame_of(&self, window: &MirrorWindow) -> Rect {
        match window.state {
            WindowState::Maximized | WindowState::FullScreen => self.viewport,
            WindowState::Minimized => Rect::default(),
            WindowState::Normal => window.rect.visible_in(self.viewport),
        }
    }
}

impl VisualHost for MirrorHost {
    fn attach_visual(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let children = self.visual_children.entry(parent).or_default();
        let index = index.min(children.len());
        children.insert(index, child);
    }

    fn detach_visual(&mut self, parent: NodeId, child: NodeId) {
        if let Some(children) = self.visual_children.get_mut(&parent) {
            children.retain(|id| *id != child);
            if children.is_empty() {
                self.visual_children.remove(&parent);
            }
        }
    }

    fn refresh(&mut self, tree: &DockTree) {
        let mut layouts = BTreeMap::new();
        let mut frames = RegionMap::default();
        for (key, window) in &self.windows {
            if !window.visible {
                continue;
            }
            let frame = self.frame_of(window);
            frames.set(*key, frame);
            layouts.insert(*key, layout_window(tree, *key, window.root, frame));
        }
        self.layouts = layouts;
        self.frames = frames;
    }
}

impl WindowHost for MirrorHost {
    fn create_window(&mut self, window: WindowKey, spec: &WindowSpec) {
        self.windows.insert(
            window,
            MirrorWindow {
                type_id: spec.type_id.clone(),
                root: spec.root,
                rect: spec.rect,
                title: spec.title.clone(),
                state: spec.state,
                visible: false,
            },
        );
    }

    fn show_window(&mut self, window: WindowKey) {
        if let Some(entry) = self.windows.get_mut(&window) {
            entry.visible = true;
            self.z_order.retain(|id| *id != window);
            self.z_order.push(window);
        }
    }

    fn close_window(&mut self, window: WindowKey) {
        self.windows.remove(&window);
        self.layouts.remove(&window);
        self.frames.remove(window);
        self.z_order.retain(|id| *id != window);
        if self.capture == Some(Surface::Window(window)) {
            self.capture = None;
        }
    }

    fn set_geometry(&mut self, window: WindowKey, rect: FloatRect) {
        if let Some(entry) = self.windows.get_mut(&window) {
            entry.rect = rect;
        }
    }

    fn set_title(&mut self, window: WindowKey, title: &str) {
        if let Some(entry) = self.windows.get_mut(&window) {
            entry.title = title.to_string();
        }
    }

    fn set_window_state(&mut self, window: WindowKey, state: WindowState) {
        if let Some(entry) = self.windows.get_mut(&window) {
            entry.state = state;
        }
    }

    fn raise_window(&mut self, window: WindowKey) {
        if self.windows.contains_key(&window) {
            self.z_order.retain(|id| *id != window);
            self.z_order.push(window);
        }
    }
}

impl HitTester for MirrorHost {
    fn hit_test(&self, window: WindowKey, column: u16, row: u16) -> Option<HitTarget> {
        self.layouts.get(&window)?.hit_test(column, row)
    }
}

impl PointerCapture for MirrorHost {
    fn capture(&mut self, surface: Surface) {
        if let Some(previous) = self.capture.replace(surface)
            && previous != surface
        {
            tracing::trace!(?previous, ?surface, "capture moved");
        }
    }

    fn release_capture(&mut self) {
        self.capture = None;
    }

    fn captured(&self) -> Option<Surface> {
        self.capture
    }
}
