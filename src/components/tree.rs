use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::ide::endpoints::EndpointIndex;
use crate::ide::paths;
use crate::ide::projection::{FlatNode, Projection};
use crate::theme::ThemeColors;

/// Renders the visible rows of the remote tree.
pub struct TreeWidget<'a> {
    projection: &'a Projection,
    endpoints: &'a EndpointIndex,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(
        projection: &'a Projection,
        endpoints: &'a EndpointIndex,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            projection,
            endpoints,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn indicator(&self, node: &FlatNode) -> &'static str {
        if !node.expandable {
            "  "
        } else if self.projection.is_expanded(&node.path) {
            "▾ "
        } else {
            "▸ "
        }
    }

    fn style(&self, node: &FlatNode, is_selected: bool) -> Style {
        if is_selected {
            return Style::default()
                .bg(self.theme.tree_selected_bg)
                .fg(self.theme.tree_selected_fg)
                .add_modifier(Modifier::BOLD);
        }
        if paths::is_system(&node.path) {
            Style::default().fg(self.theme.tree_system_fg)
        } else if node.expandable {
            Style::default()
                .fg(self.theme.tree_folder_fg)
                .add_modifier(Modifier::BOLD)
        } else if self.endpoints.is_endpoint(&node.path) {
            Style::default().fg(self.theme.tree_endpoint_fg)
        } else {
            Style::default().fg(self.theme.tree_file_fg)
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        let height = inner_area.height as usize;
        if height == 0 {
            return;
        }
        if self.projection.visible_len() == 0 {
            let hint = if self.projection.filter().is_empty() {
                "(empty)"
            } else {
                "(no matches)"
            };
            buf.set_string(
                inner_area.x,
                inner_area.y,
                hint,
                Style::default().fg(self.theme.dim_fg),
            );
            return;
        }

        let scroll = self.projection.scroll_offset;
        let rows = self
            .projection
            .visible()
            .enumerate()
            .skip(scroll)
            .take(height);

        for (i, (idx, node)) in rows.enumerate() {
            let y = inner_area.y + i as u16;
            let indent = "  ".repeat(node.level.saturating_sub(1));
            let mut spans = vec![Span::raw(indent), Span::raw(self.indicator(node))];
            spans.push(Span::raw(node.name.clone()));
            if self.endpoints.is_endpoint(&node.path) {
                spans.push(Span::raw(" ⚡"));
            }
            let style = self.style(node, idx == self.projection.selected);
            let line = Line::from(spans).style(style);
            if idx == self.projection.selected {
                buf.set_style(Rect::new(inner_area.x, y, inner_area.width, 1), style);
            }
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
