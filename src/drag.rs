//! Pointer-driven reorganisation of the dock tree.
//!
//! A gesture starts on a tab (or on a floating window's title bar) and goes
//! through three phases:
//!
//! - `Pending`: pressed but not yet moved past the drag threshold. Nothing
//!   in the tree changes.
//! - `Docked`: the item is being dragged along tab strips. Each sample
//!   reorders it, or moves it into the strip under the pointer.
//! - `Floating`: the item left every strip and now lives in its own window,
//!   which follows the pointer until release, when it may dock again.
//!
//! Each step is its own edit. Cancelling keeps whatever already happened.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use crate::config::DockOptions;
use crate::constants::MIN_DRAG_DISTANCE;
use crate::host::{DockHost, HitTarget, Surface};
use crate::ids::{NodeId, WindowKey};
use crate::window::DockManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Pending,
    /// Dragging along the tab strip of this tabbed group.
    Docked(NodeId),
    /// Moving this floating window.
    Floating(WindowKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSubject {
    Item(NodeId),
    Window(WindowKey),
}

/// Result of feeding one pointer sample to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Not part of a gesture, or a press while one is already active.
    Ignored,
    /// Pressed or moved below the threshold.
    Pending,
    /// The item moved within or between tab strips.
    Moved,
    /// Armed, but the pointer is over the item's current slot.
    NoOp,
    /// The item was torn off into a new floating window.
    Floated(WindowKey),
    WindowMoved(WindowKey),
    /// Released over a dock surface; the floating window's content was
    /// docked there.
    Docked,
    Released,
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    subject: DragSubject,
    start: (u16, u16),
    phase: DragPhase,
    grab_offset: (i32, i32),
}

#[derive(Debug, Clone)]
pub struct DragEngine {
    threshold: (u16, u16),
    gesture: Option<Gesture>,
}

impl Default for DragEngine {
    fn default() -> Self {
        Self::new(MIN_DRAG_DISTANCE)
    }
}

impl DragEngine {
    pub fn new(threshold: (u16, u16)) -> Self {
        Self {
            threshold,
            gesture: None,
        }
    }

    pub fn from_options(options: &DockOptions) -> Self {
        Self::new(options.min_drag_distance)
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn phase(&self) -> Option<DragPhase> {
        self.gesture.map(|gesture| gesture.phase)
    }

    pub fn subject(&self) -> Option<DragSubject> {
        self.gesture.map(|gesture| gesture.subject)
    }

    /// Feed a crossterm event. Left-button down/drag/up drive the gesture;
    /// Esc and focus loss cancel it.
    pub fn handle_event<H: DockHost>(
        &mut self,
        manager: &mut DockManager,
        host: &mut H,
        event: &Event,
    ) -> DragOutcome {
        match event {
            Event::Mouse(MouseEvent {
                kind, column, row, ..
            }) => match kind {
                MouseEventKind::Down(MouseButton::Left) => self.press(manager, host, *column, *row),
                MouseEventKind::Drag(MouseButton::Left) => {
                    self.pointer_moved(manager, host, *column, *row)
                }
                MouseEventKind::Up(MouseButton::Left) => self.release(manager, host, *column, *row),
                _ => DragOutcome::Ignored,
            },
            Event::Key(KeyEvent {
                code: KeyCode::Esc,
                kind: KeyEventKind::Press,
                ..
            }) if self.is_active() => self.cancel(host),
            Event::FocusLost if self.is_active() => self.cancel(host),
            _ => DragOutcome::Ignored,
        }
    }

    pub fn press<H: DockHost>(
        &mut self,
        manager: &mut DockManager,
        host: &mut H,
        column: u16,
        row: u16,
    ) -> DragOutcome {
        if self.gesture.is_some() {
            return DragOutcome::Ignored;
        }
        let Some((window, hit)) = topmost_hit(manager, host, column, row, None) else {
            return DragOutcome::Ignored;
        };
        let subject = match hit {
            HitTarget::Tab { group, index } => {
                match manager.tree().children(group).get(index) {
                    Some(item) => DragSubject::Item(*item),
                    None => return DragOutcome::Ignored,
                }
            }
            HitTarget::Chrome { window: chrome } if chrome == window => {
                match manager.window(window) {
                    Some(record) if record.is_floating() => DragSubject::Window(window),
                    _ => return DragOutcome::Ignored,
                }
            }
            _ => return DragOutcome::Ignored,
        };
        let grab_offset = match manager.window(window) {
            Some(record) => (
                column as i32 - record.rect().x,
                row as i32 - record.rect().y,
            ),
            None => (0, 0),
        };
        self.gesture = Some(Gesture {
            subject,
            start: (column, row),
            phase: DragPhase::Pending,
            grab_offset,
        });
        tracing::debug!(?subject, column, row, "drag pending");
        DragOutcome::Pending
    }

    pub fn pointer_moved<H: DockHost>(
        &mut self,
        manager: &mut DockManager,
        host: &mut H,
        column: u16,
        row: u16,
    ) -> DragOutcome {
        let Some(gesture) = self.gesture else {
            return DragOutcome::Ignored;
        };
        if !subject_alive(manager, gesture.subject) {
            return self.cancel(host);
        }
        match gesture.phase {
            DragPhase::Pending => {
                let dx = column.abs_diff(gesture.start.0);
                let dy = row.abs_diff(gesture.start.1);
                if dx < self.threshold.0 && dy < self.threshold.1 {
                    return DragOutcome::Pending;
                }
                match gesture.subject {
                    DragSubject::Item(item) => {
                        let Some(group) = manager.group_of(item) else {
                            return self.cancel(host);
                        };
                        self.set_phase(DragPhase::Docked(group));
                        host.capture(Surface::Group(group));
                        tracing::debug!(item = ?item, group = ?group, "drag armed");
                        self.docked_step(manager, host, item, column, row)
                    }
                    DragSubject::Window(window) => {
                        self.set_phase(DragPhase::Floating(window));
                        host.capture(Surface::Window(window));
                        let _ = manager.bring_to_front(window);
                        tracing::debug!(window = ?window, "window drag armed");
                        self.floating_step(manager, host, window, column, row)
                    }
                }
            }
            DragPhase::Docked(_) => match gesture.subject {
                DragSubject::Item(item) => self.docked_step(manager, host, item, column, row),
                DragSubject::Window(_) => DragOutcome::Ignored,
            },
            DragPhase::Floating(window) => self.floating_step(manager, host, window, column, row),
        }
    }

    pub fn release<H: DockHost>(
        &mut self,
        manager: &mut DockManager,
        host: &mut H,
        column: u16,
        row: u16,
    ) -> DragOutcome {
        let Some(gesture) = self.gesture.take() else {
            return DragOutcome::Ignored;
        };
        host.release_capture();
        match gesture.phase {
            DragPhase::Pending => {
                // a click: select the pressed tab
                if let DragSubject::Item(item) = gesture.subject
                    && let Some(group) = manager.group_of(item)
                    && manager.select(group, item).is_ok()
                {
                    manager.flush_to(host);
                }
                DragOutcome::Released
            }
            DragPhase::Docked(_) => DragOutcome::Released,
            DragPhase::Floating(window) => {
                if manager.window(window).is_none() {
                    return DragOutcome::Released;
                }
                let docked = match topmost_hit(manager, host, column, row, Some(window)) {
                    Some((_, HitTarget::Pane { node, zone })) => {
                        manager.dock_window(window, node, zone)
                    }
                    Some((_, HitTarget::Tab { group, index })) => {
                        manager.dock_window_tab(window, group, Some(index))
                    }
                    Some((_, HitTarget::TabStrip { group })) => {
                        manager.dock_window_tab(window, group, None)
                    }
                    _ => return DragOutcome::Released,
                };
                match docked {
                    Ok(()) => {
                        manager.flush_to(host);
                        tracing::debug!(window = ?window, "drop docked window");
                        DragOutcome::Docked
                    }
                    Err(err) => {
                        tracing::debug!(window = ?window, error = %err, "drop rejected; window stays floating");
                        DragOutcome::Released
                    }
                }
            }
        }
    }

    /// End the gesture without undoing the steps already taken.
    pub fn cancel<H: DockHost>(&mut self, host: &mut H) -> DragOutcome {
        if self.gesture.take().is_none() {
            return DragOutcome::Ignored;
        }
        host.release_capture();
        tracing::debug!("drag cancelled");
        DragOutcome::Cancelled
    }

    fn set_phase(&mut self, phase: DragPhase) {
        if let Some(gesture) = self.gesture.as_mut() {
            gesture.phase = phase;
        }
    }

    fn docked_step<H: DockHost>(
        &mut self,
        manager: &mut DockManager,
        host: &mut H,
        item: NodeId,
        column: u16,
        row: u16,
    ) -> DragOutcome {
        let strip = topmost_hit(manager, host, column, row, None)
            .and_then(|(_, hit)| hit.strip_group().map(|group| (group, hit)));
        let Some((group, hit)) = strip else {
            return self.float_item(manager, host, item, column, row);
        };
        let index = match hit {
            HitTarget::Tab { index, .. } => Some(index),
            _ => None,
        };
        if manager.group_of(item) == Some(group) {
            let children = manager.tree().children(group);
            let current = children.iter().position(|id| *id == item);
            let wanted = index.unwrap_or(children.len().saturating_sub(1));
            if current == Some(wanted) {
                return DragOutcome::NoOp;
            }
        }
        match manager.dock_item_tab(item, group, index) {
            Ok(()) => {
                if host.captured() != Some(Surface::Group(group)) {
                    host.capture(Surface::Group(group));
                }
                self.set_phase(DragPhase::Docked(group));
                manager.flush_to(host);
                DragOutcome::Moved
            }
            Err(err) => {
                tracing::debug!(item = ?item, error = %err, "tab insert rejected; floating instead");
                self.float_item(manager, host, item, column, row)
            }
        }
    }

    fn float_item<H: DockHost>(
        &mut self,
        manager: &mut DockManager,
        host: &mut H,
        item: NodeId,
        column: u16,
        row: u16,
    ) -> DragOutcome {
        // the item is already alone in a floating window: move that one
        if let Some(window) = manager.window_of(item)
            && let Some(record) = manager.window(window)
            && record.is_floating()
            && manager.tree().items_under(record.root()) == [item]
        {
            let origin = (record.rect().x, record.rect().y);
            if let Some(gesture) = self.gesture.as_mut() {
                gesture.grab_offset = (
                    gesture.start.0 as i32 - origin.0,
                    gesture.start.1 as i32 - origin.1,
                );
                gesture.phase = DragPhase::Floating(window);
            }
            host.capture(Surface::Window(window));
            let _ = manager.bring_to_front(window);
            return self.floating_step(manager, host, window, column, row);
        }

        // land with the pointer over the new window's first tab
        let grab_offset = (1, 1);
        let at = (column as i32 - grab_offset.0, row as i32 - grab_offset.1);
        match manager.create_floating_window_for(item, at) {
            Ok(window) => {
                if let Some(gesture) = self.gesture.as_mut() {
                    gesture.grab_offset = grab_offset;
                    gesture.phase = DragPhase::Floating(window);
                }
                host.capture(Surface::Window(window));
                manager.flush_to(host);
                DragOutcome::Floated(window)
            }
            Err(err) => {
                tracing::warn!(item = ?item, error = %err, "failed to float dragged item");
                self.cancel(host)
            }
        }
    }

    fn floating_step<H: DockHost>(
        &mut self,
        manager: &mut DockManager,
        host: &mut H,
        window: WindowKey,
        column: u16,
        row: u16,
    ) -> DragOutcome {
        let Some(gesture) = self.gesture else {
            return DragOutcome::Ignored;
        };
        let x = column as i32 - gesture.grab_offset.0;
        let y = row as i32 - gesture.grab_offset.1;
        if manager.move_window(window, x, y).is_err() {
            return self.cancel(host);
        }
        manager.flush_to(host);
        DragOutcome::WindowMoved(window)
    }
}

fn subject_alive(manager: &DockManager, subject: DragSubject) -> bool {
    match subject {
        DragSubject::Item(item) => manager.tree().item(item).is_some(),
        DragSubject::Window(window) => manager.window(window).is_some(),
    }
}

/// Hit test windows front to back, optionally skipping one.
fn topmost_hit<H: DockHost>(
    manager: &DockManager,
    host: &H,
    column: u16,
    row: u16,
    exclude: Option<WindowKey>,
) -> Option<(WindowKey, HitTarget)> {
    manager
        .z_order()
        .iter()
        .rev()
        .filter(|window| Some(**window) != exclude)
        .find_map(|window| Some((*window, host.hit_test(*window, column, row)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MirrorHost, PointerCapture};
    use crate::tree::DockItem;
    use ratatui::prelude::Rect;

    fn setup() -> (DockManager, MirrorHost, NodeId, Vec<NodeId>) {
        let mut manager = DockManager::default();
        let items: Vec<NodeId> = ["A", "B", "C"]
            .iter()
            .map(|id| manager.open_item(DockItem::new(*id, *id)).unwrap())
            .collect();
        let group = manager.group_of(items[0]).unwrap();
        let mut host = MirrorHost::new(Rect::new(0, 0, 120, 40));
        manager.flush_to(&mut host);
        (manager, host, group, items)
    }

    #[test]
    fn movement_below_threshold_changes_nothing() {
        let (mut manager, mut host, group, items) = setup();
        let mut drag = DragEngine::default();
        // tab C spans columns 7..10 on the strip row
        assert_eq!(drag.press(&mut manager, &mut host, 8, 1), DragOutcome::Pending);
        assert_eq!(
            drag.pointer_moved(&mut manager, &mut host, 9, 1),
            DragOutcome::Pending
        );
        assert!(manager.pending_commands().is_empty());
        assert!(host.captured().is_none());
        assert_eq!(drag.release(&mut manager, &mut host, 9, 1), DragOutcome::Released);
        assert_eq!(manager.tree().children(group), items.as_slice());
        assert_eq!(manager.tree().selected(group), Some(items[2]));
    }

    #[test]
    fn dragging_along_the_strip_reorders() {
        let (mut manager, mut host, group, items) = setup();
        let mut drag = DragEngine::default();
        drag.press(&mut manager, &mut host, 8, 1);
        assert_eq!(
            drag.pointer_moved(&mut manager, &mut host, 2, 1),
            DragOutcome::Moved
        );
        assert_eq!(manager.tree().children(group), &[items[2], items[0], items[1]]);
        assert_eq!(host.captured(), Some(Surface::Group(group)));
        // own slot again
        assert_eq!(
            drag.pointer_moved(&mut manager, &mut host, 2, 1),
            DragOutcome::NoOp
        );
        assert_eq!(drag.release(&mut manager, &mut host, 2, 1), DragOutcome::Released);
        assert!(host.captured().is_none());
    }

    #[test]
    fn a_second_press_is_ignored_while_active() {
        let (mut manager, mut host, _, _) = setup();
        let mut drag = DragEngine::default();
        drag.press(&mut manager, &mut host, 8, 1);
        assert_eq!(drag.press(&mut manager, &mut host, 2, 1), DragOutcome::Ignored);
        assert_eq!(drag.cancel(&mut host), DragOutcome::Cancelled);
        assert_eq!(drag.cancel(&mut host), DragOutcome::Ignored);
    }

    #[test]
    fn leaving_the_strip_floats_the_item() {
        let (mut manager, mut host, group, items) = setup();
        let mut drag = DragEngine::default();
        drag.press(&mut manager, &mut host, 8, 1);
        let DragOutcome::Floated(window) = drag.pointer_moved(&mut manager, &mut host, 100, 30)
        else {
            panic!("expected the item to float");
        };
        assert_eq!(manager.tree().children(group), &[items[0], items[1]]);
        assert_eq!(manager.window_of(items[2]), Some(window));
        assert_eq!(host.captured(), Some(Surface::Window(window)));

        assert_eq!(
            drag.pointer_moved(&mut manager, &mut host, 104, 32),
            DragOutcome::WindowMoved(window)
        );
        let rect = manager.window(window).unwrap().rect();
        assert_eq!((rect.x, rect.y), (103, 31));
        assert_eq!(
            drag.release(&mut manager, &mut host, 104, 32),
            DragOutcome::Released
        );
        assert_eq!(manager.window_count(), 2);
    }

    #[test]
    fn dropping_a_floating_window_on_a_pane_docks_it() {
        let (mut manager, mut host, group, items) = setup();
        let mut drag = DragEngine::default();
        drag.press(&mut manager, &mut host, 8, 1);
        let DragOutcome::Floated(window) = drag.pointer_moved(&mut manager, &mut host, 100, 30)
        else {
            panic!("expected the item to float");
        };
        // centre of the main window's body
        drag.pointer_moved(&mut manager, &mut host, 40, 12);
        assert_eq!(drag.release(&mut manager, &mut host, 40, 12), DragOutcome::Docked);
        assert!(manager.window(window).is_none());
        assert_eq!(manager.tree().children(group), items.as_slice());
        assert_eq!(host.window_count(), 1);
    }

    #[test]
    fn esc_cancels_through_the_event_adapter() {
        let (mut manager, mut host, _, _) = setup();
        let mut drag = DragEngine::default();
        let down = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 8,
            row: 1,
            modifiers: crossterm::event::KeyModifiers::NONE,
        });
        assert_eq!(
            drag.handle_event(&mut manager, &mut host, &down),
            DragOutcome::Pending
        );
        let esc = Event::Key(KeyEvent::new(
            KeyCode::Esc,
            crossterm::event::KeyModifiers::NONE,
        ));
        assert_eq!(
            drag.handle_event(&mut manager, &mut host, &esc),
            DragOutcome::Cancelled
        );
        assert!(!drag.is_active());
    }
}
