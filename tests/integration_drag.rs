use ratatui::layout::Rect;
use term_dock::host::{PointerCapture, Surface};
use term_dock::{
    DockItem, DockManager, DragEngine, DragOutcome, DropZone, GroupKind, MirrorHost, NodeId,
    Orientation,
};

// Main window frame is 80x24 at the origin; tabs A, B, C sit on row 1 at
// columns 1..4, 4..7 and 7..10.
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
fn one_row_of_vertical_travel_arms_the_drag() {
    let (mut manager, mut host, group, items) = setup();
    let mut drag = DragEngine::default();
    drag.press(&mut manager, &mut host, 8, 1);
    let outcome = drag.pointer_moved(&mut manager, &mut host, 8, 2);
    assert!(matches!(outcome, DragOutcome::Floated(_)), "{outcome:?}");
    assert_eq!(manager.tree().children(group), &items[..2]);
    drag.cancel(&mut host);
}

#[test]
fn dropping_on_a_pane_edge_splits_the_main_window() {
    let (mut manager, mut host, group, items) = setup();
    let mut drag = DragEngine::default();
    drag.press(&mut manager, &mut host, 8, 1);
    let DragOutcome::Floated(window) = drag.pointer_moved(&mut manager, &mut host, 100, 30) else {
        panic!("expected the item to float");
    };
    assert_eq!(host.window_count(), 2);

    // right edge band of the main window's body
    drag.pointer_moved(&mut manager, &mut host, 75, 12);
    assert_eq!(
        drag.release(&mut manager, &mut host, 75, 12),
        DragOutcome::Docked
    );

    assert!(manager.window(window).is_none());
    assert_eq!(host.window_count(), 1);
    let root = manager.main_root();
    let stack = manager.tree().children(root)[0];
    assert_eq!(
        manager.tree().group_kind(stack),
        Some(GroupKind::Stack(Orientation::Horizontal))
    );
    let halves = manager.tree().children(stack).to_vec();
    assert_eq!(halves[0], group);
    assert_eq!(manager.tree().children(halves[1]), &[items[2]]);
    assert_eq!(manager.window_of(items[2]), Some(manager.main_window()));
    assert!(manager.tree().invariant_violations().is_empty());
}

#[test]
fn dragging_the_only_tab_of_a_floating_window_moves_the_window() {
    let (mut manager, mut host, _, items) = setup();
    let mut drag = DragEngine::default();
    drag.press(&mut manager, &mut host, 8, 1);
    let DragOutcome::Floated(window) = drag.pointer_moved(&mut manager, &mut host, 100, 30) else {
        panic!("expected the item to float");
    };
    drag.pointer_moved(&mut manager, &mut host, 104, 32);
    assert_eq!(
        drag.release(&mut manager, &mut host, 104, 32),
        DragOutcome::Released
    );
    let rect = manager.window(window).unwrap().rect();
    assert_eq!((rect.x, rect.y), (103, 31));

    // tab C of the floating window is at column 104..107, row 32
    assert_eq!(
        drag.press(&mut manager, &mut host, 105, 32),
        DragOutcome::Pending
    );
    assert_eq!(
        drag.pointer_moved(&mut manager, &mut host, 90, 20),
        DragOutcome::WindowMoved(window)
    );
    let rect = manager.window(window).unwrap().rect();
    assert_eq!((rect.x, rect.y), (88, 19));
    assert_eq!(manager.window_count(), 2);
    assert_eq!(manager.window_of(items[2]), Some(window));
    drag.release(&mut manager, &mut host, 90, 20);
}

#[test]
fn clicking_a_tab_selects_it_without_moving_anything() {
    let (mut manager, mut host, group, items) = setup();
    let mut drag = DragEngine::default();
    drag.press(&mut manager, &mut host, 5, 1);
    assert_eq!(
        drag.release(&mut manager, &mut host, 5, 1),
        DragOutcome::Released
    );
    assert_eq!(manager.tree().selected(group), Some(items[1]));
    assert_eq!(manager.tree().children(group), items.as_slice());
}

#[test]
fn dragging_a_tab_onto_another_strip_moves_it_across_groups() {
    let (mut manager, mut host, left, items) = setup();
    manager.dock_item(items[2], items[0], DropZone::Right).unwrap();
    manager.flush_to(&mut host);
    let right = manager.group_of(items[2]).unwrap();
    assert_ne!(right, left);

    let layout = host.layout(manager.main_window()).unwrap().clone();
    let pane = |group: NodeId| {
        layout
            .panes
            .iter()
            .find(|pane| pane.node == group)
            .cloned()
            .unwrap()
    };
    let source = pane(right).tabs[0].rect;
    let target = pane(left).strip;
    // empty part of the left strip, past its two tabs
    let (column, row) = (target.x + target.width - 2, target.y);

    let mut drag = DragEngine::default();
    drag.press(&mut manager, &mut host, source.x + 1, source.y);
    assert_eq!(
        drag.pointer_moved(&mut manager, &mut host, column, row),
        DragOutcome::Moved
    );

    assert_eq!(manager.tree().children(left), items.as_slice());
    assert_eq!(manager.tree().selected(left), Some(items[2]));
    assert!(host.captured() == Some(Surface::Group(left)));
    assert!(!manager.tree().contains(right));
    assert_eq!(manager.tree().children(manager.main_root()), &[left]);
    assert!(manager.tree().invariant_violations().is_empty());

    drag.release(&mut manager, &mut host, column, row);
    assert!(host.captured().is_none());
    assert_eq!(manager.window_count(), 1);
}
