use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

pub const TREE_HINTS: &str = " a:new A:folder r:ren d:del /:filter m:macro q:quit ";
pub const EDITOR_HINTS: &str = " ^S:save ^W:close ^Z:undo Esc:tree ";

/// Bottom line: active folder, document info and key hints, or a status message.
pub struct StatusBarWidget<'a> {
    folder: &'a str,
    info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    key_hints: &'a str,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(folder: &'a str, info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            folder,
            info,
            theme,
            status_message: None,
            is_error: false,
            key_hints: TREE_HINTS,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn key_hints(mut self, hints: &'a str) -> Self {
        self.key_hints = hints;
        self
    }
}

/// Keep the last `max` characters of `text`, marking the cut with `...`.
fn truncate_left(text: &str, max: usize) -> String {
    let len = text.chars().count();
    if len <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().skip(len - max).collect();
    }
    let tail: String = text.chars().skip(len - (max - 3)).collect();
    format!("...{}", tail)
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let display: String = msg.chars().take(width).collect();
            let display = format!("{:<width$}", display, width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        let hints_len = self.key_hints.chars().count();
        let remaining = width.saturating_sub(hints_len);
        let info_len = self.info.chars().count();
        let folder = truncate_left(self.folder, remaining.saturating_sub(info_len + 1));
        let gap = remaining
            .saturating_sub(folder.chars().count())
            .saturating_sub(info_len);

        let mut spans = vec![
            Span::styled(folder, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
        ];
        if info_len < remaining {
            spans.push(Span::styled(self.info, Style::default().fg(self.theme.info_fg)));
        }
        spans.push(Span::styled(
            self.key_hints,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
