//! Cell geometry for presenting dock windows in a terminal.
//!
//! Nothing in here mutates the tree. A host lays each window out after a
//! flush and answers hit tests from the result.

use std::collections::BTreeMap;

use ratatui::prelude::Rect;

use crate::constants::TAB_STRIP_HEIGHT;
use crate::host::{DropZone, HitTarget};
use crate::ids::{NodeId, WindowKey};
use crate::tree::{DockTree, GroupKind, NodeKind, Orientation};

#[derive(Debug, Clone)]
pub struct RegionMap<T: Copy + Eq + Ord> {
    regions: BTreeMap<T, Rect>,
}

impl<T: Copy + Eq + Ord> Default for RegionMap<T> {
    fn default() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }
}

impl<T: Copy + Eq + Ord> RegionMap<T> {
    pub fn ids(&self) -> Vec<T> {
        self.regions.keys().copied().collect()
    }

    pub fn set(&mut self, id: T, rect: Rect) {
        self.regions.insert(id, rect);
    }

    pub fn get(&self, id: T) -> Option<Rect> {
        self.regions.get(&id).copied()
    }

    pub fn remove(&mut self, id: T) -> Option<Rect> {
        self.regions.remove(&id)
    }

    /// First id in `ids` whose region contains the point.
    pub fn hit_test(&self, column: u16, row: u16, ids: &[T]) -> Option<T> {
        for id in ids {
            if let Some(rect) = self.regions.get(id)
                && rect_contains(*rect, column, row)
            {
                return Some(*id);
            }
        }
        None
    }
}

pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    let max_x = rect.x.saturating_add(rect.width);
    let max_y = rect.y.saturating_add(rect.height);
    column >= rect.x && column < max_x && row >= rect.y && row < max_y
}

/// Split `area` into `count` near-equal slices; the last slice takes the
/// remainder.
pub fn split_even(orientation: Orientation, area: Rect, count: usize) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let total = match orientation {
        Orientation::Horizontal => area.width,
        Orientation::Vertical => area.height,
    };
    let total = usize::from(total);
    let portion = total / count;
    let mut sizes = vec![u16::try_from(portion).unwrap_or(u16::MAX); count];
    if let Some(last) = sizes.last_mut() {
        let rest = total.saturating_sub(portion.saturating_mul(count - 1));
        *last = u16::try_from(rest).unwrap_or(u16::MAX);
    }
    build_rects_from_sizes(orientation, area, &sizes)
}

fn build_rects_from_sizes(orientation: Orientation, area: Rect, sizes: &[u16]) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(sizes.len());
    let mut cursor_x = area.x;
    let mut cursor_y = area.y;
    for size in sizes {
        let rect = match orientation {
            Orientation::Horizontal => {
                let rect = Rect {
                    x: cursor_x,
                    y: area.y,
                    width: *size,
                    height: area.height,
                };
                cursor_x = cursor_x.saturating_add(*size);
                rect
            }
            Orientation::Vertical => {
                let rect = Rect {
                    x: area.x,
                    y: cursor_y,
                    width: area.width,
                    height: *size,
                };
                cursor_y = cursor_y.saturating_add(*size);
                rect
            }
        };
        rects.push(rect);
    }
    rects
}

/// Which edge band of `rect` the point falls in. Points away from every edge
/// are `Center`.
pub fn drop_zone(rect: Rect, column: u16, row: u16) -> DropZone {
    let d_left = column.saturating_sub(rect.x);
    let d_right = (rect.x + rect.width).saturating_sub(1).saturating_sub(column);
    let d_top = row.saturating_sub(rect.y);
    let d_bottom = (rect.y + rect.height).saturating_sub(1).saturating_sub(row);
    let sens_x = (rect.width / 4).clamp(1, 8);
    let sens_y = (rect.height / 4).clamp(1, 4);

    if d_left < sens_x && d_left <= d_right {
        DropZone::Left
    } else if d_right < sens_x {
        DropZone::Right
    } else if d_top < sens_y && d_top <= d_bottom {
        DropZone::Top
    } else if d_bottom < sens_y {
        DropZone::Bottom
    } else {
        DropZone::Center
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLayout {
    pub item: NodeId,
    pub rect: Rect,
    pub selected: bool,
}

/// A tabbed group, or an item placed outside one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneLayout {
    pub node: NodeId,
    pub tabbed: bool,
    pub strip: Rect,
    pub body: Rect,
    pub tabs: Vec<TabLayout>,
    /// Item whose content fills the body.
    pub content: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLayout {
    pub window: WindowKey,
    pub frame: Rect,
    pub inner: Rect,
    pub panes: Vec<PaneLayout>,
}

impl WindowLayout {
    pub fn hit_test(&self, column: u16, row: u16) -> Option<HitTarget> {
        if !rect_contains(self.frame, column, row) {
            return None;
        }
        for pane in &self.panes {
            if pane.tabbed {
                if let Some(index) = pane
                    .tabs
                    .iter()
                    .position(|tab| rect_contains(tab.rect, column, row))
                {
                    return Some(HitTarget::Tab {
                        group: pane.node,
                        index,
                    });
                }
                if rect_contains(pane.strip, column, row) {
                    return Some(HitTarget::TabStrip { group: pane.node });
                }
            } else if rect_contains(pane.strip, column, row) {
                return Some(HitTarget::Pane {
                    node: pane.node,
                    zone: DropZone::Center,
                });
            }
            if rect_contains(pane.body, column, row) {
                return Some(HitTarget::Pane {
                    node: pane.node,
                    zone: drop_zone(pane.body, column, row),
                });
            }
        }
        Some(HitTarget::Chrome {
            window: self.window,
        })
    }
}

/// Lay out the subtree under `root` inside a bordered `frame`.
pub fn layout_window(tree: &DockTree, window: WindowKey, root: NodeId, frame: Rect) -> WindowLayout {
    let inner = if frame.width >= 2 && frame.height >= 2 {
        Rect {
            x: frame.x + 1,
            y: frame.y + 1,
            width: frame.width - 2,
            height: frame.height - 2,
        }
    } else {
        Rect::default()
    };
    let mut panes = Vec::new();
    layout_node(tree, root, inner, &mut panes);
    WindowLayout {
        window,
        frame,
        inner,
        panes,
    }
}

fn layout_node(tree: &DockTree, node: NodeId, area: Rect, panes: &mut Vec<PaneLayout>) {
    let Some(dock_node) = tree.node(node) else {
        return;
    };
    match dock_node.kind() {
        NodeKind::Group(GroupKind::Simple) => {
            if let Some(child) = dock_node.children().first() {
                layout_node(tree, *child, area, panes);
            }
        }
        NodeKind::Group(GroupKind::Stack(orientation)) => {
            let rects = split_even(*orientation, area, dock_node.children().len());
            for (child, rect) in dock_node.children().iter().zip(rects) {
                layout_node(tree, *child, rect, panes);
            }
        }
        NodeKind::Group(GroupKind::Tabbed) => {
            let (strip, body) = split_strip(area);
            let selected = tree.selected(node);
            let mut cursor = strip.x;
            let end = strip.x.saturating_add(strip.width);
            let mut tabs = Vec::new();
            for child in dock_node.children() {
                let title_len = tree
                    .item(*child)
                    .map(|item| item.title.chars().count())
                    .unwrap_or(0);
                let width = (title_len as u16).saturating_add(2).min(end.saturating_sub(cursor));
                if width == 0 {
                    break;
                }
                tabs.push(TabLayout {
                    item: *child,
                    rect: Rect {
                        x: cursor,
                        y: strip.y,
                        width,
                        height: strip.height,
                    },
                    selected: selected == Some(*child),
                });
                cursor = cursor.saturating_add(width);
            }
            panes.push(PaneLayout {
                node,
                tabbed: true,
                strip,
                body,
                tabs,
                content: selected,
            });
        }
        NodeKind::Item(_) => {
            let (strip, body) = split_strip(area);
            panes.push(PaneLayout {
                node,
                tabbed: false,
                strip,
                body,
                tabs: Vec::new(),
                content: Some(node),
            });
        }
    }
}

fn split_strip(area: Rect) -> (Rect, Rect) {
    let strip_height = TAB_STRIP_HEIGHT.min(area.height);
    let strip = Rect {
        height: strip_height,
        ..area
    };
    let body = Rect {
        y: area.y.saturating_add(strip_height),
        height: area.height - strip_height,
        ..area
    };
    (strip, body)
}
