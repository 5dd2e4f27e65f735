//! Capabilities the engine needs from the runtime that presents it.
//!
//! The engine never holds on to a host. The [`crate::window::DockManager`]
//! queues [`HostCommand`]s as it edits the tree, and
//! [`crate::window::DockManager::flush_to`] replays them against whatever
//! implements [`DockHost`].

pub mod mirror;

pub use mirror::{MirrorHost, MirrorWindow};

use crate::ids::{NodeId, WindowKey};
use crate::tree::{DockTree, SplitSide, VisualOp};
use crate::window::{FloatRect, WindowState};

/// Part of a tabbed pane's body a drop lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropZone {
    Center,
    Left,
    Right,
    Top,
    Bottom,
}

impl DropZone {
    pub fn split_side(self) -> Option<SplitSide> {
        match self {
            DropZone::Center => None,
            DropZone::Left => Some(SplitSide::Left),
            DropZone::Right => Some(SplitSide::Right),
            DropZone::Top => Some(SplitSide::Top),
            DropZone::Bottom => Some(SplitSide::Bottom),
        }
    }
}

/// Most specific thing under the pointer inside one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTarget {
    /// The tab of the `index`th child of a tabbed group.
    Tab { group: NodeId, index: usize },
    /// Free space in a tab strip, past the last tab.
    TabStrip { group: NodeId },
    /// The body of a pane showing `node`.
    Pane { node: NodeId, zone: DropZone },
    /// Window frame or title bar.
    Chrome { window: WindowKey },
}

impl HitTarget {
    /// Tabbed group whose strip is under the pointer, if any.
    pub fn strip_group(&self) -> Option<NodeId> {
        match self {
            HitTarget::Tab { group, .. } | HitTarget::TabStrip { group } => Some(*group),
            _ => None,
        }
    }
}

/// What holds pointer capture during a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Group(NodeId),
    Window(WindowKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub type_id: String,
    pub root: NodeId,
    pub rect: FloatRect,
    pub title: String,
    pub state: WindowState,
}

pub trait VisualHost {
    fn attach_visual(&mut self, parent: NodeId, child: NodeId, index: usize);
    fn detach_visual(&mut self, parent: NodeId, child: NodeId);

    /// Called once after every flushed batch so the host can re-measure.
    fn refresh(&mut self, _tree: &DockTree) {}
}

pub trait WindowHost {
    fn create_window(&mut self, window: WindowKey, spec: &WindowSpec);
    fn show_window(&mut self, window: WindowKey);
    fn close_window(&mut self, window: WindowKey);
    fn set_geometry(&mut self, window: WindowKey, rect: FloatRect);
    fn set_title(&mut self, window: WindowKey, title: &str);
    fn set_window_state(&mut self, window: WindowKey, state: WindowState);
    fn raise_window(&mut self, window: WindowKey);
}

pub trait HitTester {
    fn hit_test(&self, window: WindowKey, column: u16, row: u16) -> Option<HitTarget>;
}

pub trait PointerCapture {
    fn capture(&mut self, surface: Surface);
    fn release_capture(&mut self);
    fn captured(&self) -> Option<Surface>;
}

pub trait DockHost: VisualHost + WindowHost + HitTester + PointerCapture {}

impl<T: VisualHost + WindowHost + HitTester + PointerCapture> DockHost for T {}

/// Deferred host call, in the order the engine produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Visual(VisualOp),
    CreateWindow {
        window: WindowKey,
        spec: WindowSpec,
    },
    ShowWindow(WindowKey),
    CloseWindow(WindowKey),
    SetGeometry {
        window: WindowKey,
        rect: FloatRect,
    },
    SetTitle {
        window: WindowKey,
        title: String,
    },
    SetState {
        window: WindowKey,
        state: WindowState,
    },
    Raise(WindowKey),
}

impl HostCommand {
    pub fn apply<H: VisualHost + WindowHost + ?Sized>(&self, host: &mut H) {
        match self {
            HostCommand::Visual(VisualOp::Attach {
                parent,
                child,
                index,
            }) => host.attach_visual(*parent, *child, *index),
            HostCommand::Visual(VisualOp::Detach { parent, child }) => {
                host.detach_visual(*parent, *child)
            }
            HostCommand::CreateWindow { window, spec } => host.create_window(*window, spec),
            HostCommand::ShowWindow(window) => host.show_window(*window),
            HostCommand::CloseWindow(window) => host.close_window(*window),
            HostCommand::SetGeometry { window, rect } => host.set_geometry(*window, *rect),
            HostCommand::SetTitle { window, title } => host.set_title(*window, title),
            HostCommand::SetState { window, state } => host.set_window_state(*window, *state),
            HostCommand::Raise(window) => host.raise_window(*window),
        }
    }
}
