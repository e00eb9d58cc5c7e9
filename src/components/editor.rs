use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::ide::buffer::TextBuffer;
use crate::ide::documents::DocumentRegistry;
use crate::theme::ThemeColors;

/// Renders the open-document tabs and the active buffer with a line-number gutter.
pub struct EditorWidget<'a> {
    documents: &'a DocumentRegistry,
    theme: &'a ThemeColors,
    focused: bool,
    block: Option<Block<'a>>,
}

impl<'a> EditorWidget<'a> {
    pub fn new(documents: &'a DocumentRegistry, theme: &'a ThemeColors, focused: bool) -> Self {
        Self {
            documents,
            theme,
            focused,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Rows left for text once the tab line is drawn inside `inner_height`.
    pub fn text_height(inner_height: u16) -> usize {
        inner_height.saturating_sub(1) as usize
    }

    fn gutter_width(buffer: &TextBuffer) -> u16 {
        let digits = buffer.line_count().max(1).to_string().len() as u16;
        digits + 2
    }

    fn render_tabs(&self, area: Rect, buf: &mut Buffer) {
        let active = self.documents.active_path();
        let mut spans = Vec::new();
        for doc in self.documents.documents() {
            let is_active = Some(doc.path.as_str()) == active;
            let style = if is_active {
                Style::default()
                    .fg(self.theme.tab_active_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.tab_inactive_fg)
            };
            let marker = if doc.dirty { "● " } else { "" };
            spans.push(Span::styled(format!(" {}{} ", marker, doc.name), style));
            spans.push(Span::styled("│", Style::default().fg(self.theme.border_fg)));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }

    fn render_buffer(&self, buffer: &TextBuffer, area: Rect, buf: &mut Buffer) {
        let gutter_w = Self::gutter_width(buffer);
        let code_width = area.width.saturating_sub(gutter_w) as usize;
        if code_width == 0 {
            return;
        }
        // Scroll horizontally so the cursor column stays on screen.
        let h_offset = buffer.cursor_col.saturating_sub(code_width - 1);
        let cursor_style = Style::default()
            .fg(self.theme.editor_cursor_fg)
            .bg(self.theme.editor_cursor_bg);
        let code_x = area.x + gutter_w;

        for row in 0..area.height as usize {
            let line_idx = buffer.scroll_offset + row;
            let y = area.y + row as u16;

            let Some(line) = buffer.lines().get(line_idx) else {
                buf.set_string(area.x, y, "~", Style::default().fg(self.theme.dim_fg));
                continue;
            };
            let is_current = line_idx == buffer.cursor_line;

            if is_current {
                buf.set_style(
                    Rect::new(code_x, y, code_width as u16, 1),
                    Style::default().bg(self.theme.editor_current_line_bg),
                );
            }

            let num_style = if is_current {
                Style::default()
                    .fg(self.theme.editor_line_nr_current)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.editor_line_nr)
            };
            let num = format!("{:>width$} ", line_idx + 1, width = (gutter_w - 2) as usize);
            buf.set_string(area.x, y, num, num_style);
            buf.set_string(
                area.x + gutter_w - 1,
                y,
                "│",
                Style::default().fg(self.theme.editor_gutter_sep),
            );

            let text_style = Style::default().fg(self.theme.editor_fg);
            for (col, ch) in line.chars().enumerate().skip(h_offset) {
                let x = col - h_offset;
                if x >= code_width {
                    break;
                }
                let style = if is_current && self.focused && col == buffer.cursor_col {
                    cursor_style
                } else {
                    text_style
                };
                buf.set_string(code_x + x as u16, y, ch.to_string(), style);
            }

            let line_len = line.chars().count();
            if is_current && self.focused && buffer.cursor_col >= line_len {
                let x = buffer.cursor_col - h_offset;
                if x < code_width {
                    buf.set_string(code_x + x as u16, y, " ", cursor_style);
                }
            }
        }
    }
}

impl<'a> Widget for EditorWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let Some(doc) = self.documents.active() else {
            buf.set_string(
                inner.x,
                inner.y,
                "No open documents. Select a file and press Enter.",
                Style::default().fg(self.theme.dim_fg),
            );
            return;
        };

        self.render_tabs(Rect::new(inner.x, inner.y, inner.width, 1), buf);
        let text_area = Rect::new(
            inner.x,
            inner.y + 1,
            inner.width,
            Self::text_height(inner.height) as u16,
        );
        self.render_buffer(&doc.buffer, text_area, buf);
    }
}
