use ratatui::buffer::Buffer;
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};

use crate::host::MirrorHost;
use crate::layout::{PaneLayout, WindowLayout};
use crate::tree::{DockItem, DockTree};

type ContentFn<'a> = dyn Fn(&DockItem) -> String + 'a;

/// Draws every window a [`MirrorHost`] knows about, back to front. The
/// topmost window gets the focused header style.
pub struct DockView<'a> {
    tree: &'a DockTree,
    host: &'a MirrorHost,
    content: Option<&'a ContentFn<'a>>,
}

impl<'a> DockView<'a> {
    pub fn new(tree: &'a DockTree, host: &'a MirrorHost) -> Self {
        Self {
            tree,
            host,
            content: None,
        }
    }

    /// Text shown in an item's body. Defaults to the item id.
    pub fn content(mut self, content: &'a ContentFn<'a>) -> Self {
        self.content = Some(content);
        self
    }

    fn body_text(&self, item: &DockItem) -> String {
        match self.content {
            Some(content) => content(item),
            None => item.item_id.to_string(),
        }
    }

    fn render_window(&self, layout: &WindowLayout, title: &str, focused: bool, buf: &mut Buffer) {
        let frame = layout.frame.intersection(buf.area);
        if frame.is_empty() {
            return;
        }
        Clear.render(frame, buf);
        let border_style = if focused {
            Style::default().fg(Color::Blue)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title_style = if focused {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(title.to_string(), title_style))
            .render(layout.frame.intersection(buf.area), buf);
        for pane in &layout.panes {
            self.render_pane(pane, focused, buf);
        }
    }

    fn render_pane(&self, pane: &PaneLayout, focused: bool, buf: &mut Buffer) {
        let strip = pane.strip.intersection(buf.area);
        if !strip.is_empty() {
            let spans: Vec<Span> = if pane.tabbed {
                pane.tabs
                    .iter()
                    .map(|tab| {
                        let title = self
                            .tree
                            .item(tab.item)
                            .map(|item| item.title.as_str())
                            .unwrap_or_default();
                        Span::styled(format!(" {title} "), tab_style(tab.selected, focused))
                    })
                    .collect()
            } else {
                let title = pane
                    .content
                    .and_then(|item| self.tree.item(item))
                    .map(|item| item.title.as_str())
                    .unwrap_or_default();
                vec![Span::styled(format!(" {title} "), tab_style(true, focused))]
            };
            Paragraph::new(Line::from(spans))
                .style(Style::default().bg(Color::DarkGray))
                .render(strip, buf);
        }
        let body = pane.body.intersection(buf.area);
        if body.is_empty() {
            return;
        }
        let Some(item) = pane.content.and_then(|item| self.tree.item(item)) else {
            return;
        };
        Paragraph::new(self.body_text(item))
            .wrap(Wrap { trim: false })
            .render(body, buf);
    }
}

fn tab_style(selected: bool, focused: bool) -> Style {
    match (selected, focused) {
        (true, true) => Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
        (true, false) => Style::default().bg(Color::Gray).fg(Color::Black),
        (false, _) => Style::default().bg(Color::DarkGray).fg(Color::White),
    }
}

impl Widget for DockView<'_> {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        let top = self.host.z_order().last().copied();
        for window in self.host.z_order() {
            let Some(record) = self.host.window(*window) else {
                continue;
            };
            if !record.visible {
                continue;
            }
            let Some(layout) = self.host.layout(*window) else {
                continue;
            };
            self.render_window(layout, &record.title, top == Some(*window), buf);
        }
    }
}

/// Plain-text dump of a buffer, one line per row. Handy in tests and logs.
pub fn buffer_text(buf: &Buffer) -> Vec<String> {
    let area = buf.area;
    (area.y..area.y + area.height)
        .map(|y| {
            (area.x..area.x + area.width)
                .map(|x| buf.cell((x, y)).map(|cell| cell.symbol()).unwrap_or(" "))
                .collect::<String>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DockItem;
    use crate::window::DockManager;

    #[test]
    fn draws_window_title_tabs_and_selected_body() {
        let mut manager = DockManager::default();
        manager.open_item(DockItem::new("left", "Left")).unwrap();
        let right = manager.open_item(DockItem::new("right", "Right")).unwrap();
        let group = manager.group_of(right).unwrap();
        manager.select(group, right).unwrap();
        let area = Rect::new(0, 0, 80, 24);
        let mut host = MirrorHost::new(area);
        manager.flush_to(&mut host);

        let mut buf = Buffer::empty(area);
        let content = |item: &DockItem| format!("body of {}", item.item_id);
        DockView::new(manager.tree(), &host)
            .content(&content)
            .render(area, &mut buf);
        let rows = buffer_text(&buf);
        assert!(rows[0].starts_with("┌main"), "{:?}", rows[0]);
        assert!(rows[1].starts_with("│ Left  Right "), "{:?}", rows[1]);
        assert!(rows[2].starts_with("│body of right"), "{:?}", rows[2]);
    }
}
