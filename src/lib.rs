//! Dockable-window layout engine.
//!
//! A [`DockManager`] owns a tree of dock groups and the windows presenting
//! it: one main window plus any number of floating ones. Items are moved
//! between tabbed groups, split stacks and floating windows by direct calls
//! or by a [`DragEngine`] fed pointer events. A [`DockLayout`] captures the
//! arrangement and restores it later.

pub mod config;
pub mod constants;
pub mod drag;
pub mod error;
pub mod host;
pub mod ids;
pub mod layout;
pub mod observer;
pub mod render;
pub mod selection;
pub mod serialization;
pub mod tracing_sub;
pub mod tree;
pub mod window;

pub use config::{DockOptions, OrphanPolicy};
pub use drag::{DragEngine, DragOutcome, DragPhase, DragSubject};
pub use error::{DockError, DockResult, StructureError};
pub use host::{DockHost, DropZone, HitTarget, HostCommand, MirrorHost};
pub use ids::{DockId, ItemId, NodeId, WindowId, WindowKey};
pub use serialization::{DockLayout, ItemLookup, ItemSpec, RestoreReport};
pub use tree::{DockItem, DockTree, GroupKind, Orientation, TreeEvent};
pub use window::{DockManager, DockScopes, DockWindow, FloatRect, WindowState};
