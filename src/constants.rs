//! Shared crate-wide constants.

/// Pointer displacement, in (columns, rows), a press must travel before it
/// becomes a drag.
///
/// Terminal cells are roughly twice as tall as they are wide, so the vertical
/// threshold is half the horizontal one. Reaching either component arms the
/// gesture.
pub const MIN_DRAG_DISTANCE: (u16, u16) = (2, 1);

/// Size given to a floating window created by tearing an item off.
pub const DEFAULT_FLOATING_SIZE: (u16, u16) = (40, 12);

/// Rows used by a tabbed group's tab strip.
pub const TAB_STRIP_HEIGHT: u16 = 1;

/// Window type id of the main window.
pub const MAIN_WINDOW_TYPE: &str = "main";

/// Window type id of floating windows created by the engine.
pub const FLOATING_WINDOW_TYPE: &str = "floating";

/// Format version written into saved layouts.
pub const LAYOUT_FORMAT_VERSION: u32 = 1;
