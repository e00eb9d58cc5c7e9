use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, Wrap},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::ide::Prompt;
use crate::theme::ThemeColors;

/// Renders the active dialog as a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }

    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width.min(area.width), height.min(area.height))
    }

    fn frame(&self, title: &str, width: u16, height: u16, area: Rect, buf: &mut Buffer, error: bool) -> Rect {
        let rect = Self::centered_rect(width, height, area);
        Clear.render(rect, buf);
        let border = if error {
            self.theme.error_fg
        } else {
            self.theme.border_focused_fg
        };
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &str, inner: Rect, buf: &mut Buffer) {
        if inner.height > 1 {
            let style = Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM);
            buf.set_line(
                inner.x,
                inner.y + inner.height - 1,
                &Line::from(Span::styled(text, style)),
                inner.width,
            );
        }
    }

    fn render_input(&self, title: &str, hint: Option<String>, area: Rect, buf: &mut Buffer) {
        let width = 60.min(area.width.saturating_sub(4));
        let height = if hint.is_some() { 6 } else { 5 };
        let inner = self.frame(title, width, height, area, buf, false);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let input = &self.dialog_state.input;
        let pos = self.dialog_state.cursor_position.min(input.len());
        let (before, rest) = input.split_at(pos);
        let (cursor_char, after) = match rest.chars().next() {
            Some(c) => rest.split_at(c.len_utf8()),
            None => (" ", ""),
        };

        // Keep the cursor in view by dropping characters on the left.
        let max_width = inner.width as usize;
        let overflow = (before.chars().count() + 1).saturating_sub(max_width);
        let before: String = before.chars().skip(overflow).collect();

        let input_style = Style::default().fg(self.theme.editor_fg);
        let cursor_style = Style::default()
            .bg(self.theme.editor_cursor_bg)
            .fg(self.theme.editor_cursor_fg)
            .add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(before, input_style),
            Span::styled(cursor_char, cursor_style),
            Span::styled(after, input_style),
        ]);
        buf.set_line(inner.x, inner.y + 1, &line, inner.width);

        if let Some(hint) = hint {
            if inner.height > 2 {
                let style = Style::default().fg(self.theme.info_fg);
                buf.set_line(
                    inner.x,
                    inner.y + 2,
                    &Line::from(Span::styled(hint, style)),
                    inner.width,
                );
            }
        }
        self.hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
    }

    fn render_decision(&self, prompt: &Prompt, area: Rect, buf: &mut Buffer) {
        let unsaved: &[String] = match prompt {
            Prompt::ConfirmDelete { unsaved, .. } => unsaved,
            _ => &[],
        };
        let message = prompt.message();
        let width = (message.chars().count() as u16 + 6)
            .clamp(40, 70)
            .min(area.width.saturating_sub(4));
        let height = (unsaved.len() as u16 + 7).min(area.height.saturating_sub(2));
        let danger = matches!(prompt, Prompt::ConfirmDelete { .. });
        let inner = self.frame(prompt.title(), width, height, area, buf, danger);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let mut lines = vec![Line::from(Span::styled(
            message,
            Style::default()
                .fg(self.theme.warning_fg)
                .add_modifier(Modifier::BOLD),
        ))];
        for path in unsaved {
            lines.push(Line::from(Span::styled(
                format!("  • {}", path),
                Style::default().fg(self.theme.editor_fg),
            )));
        }
        let body = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(body, buf);

        let choices = prompt
            .choices()
            .iter()
            .map(|(key, label, _)| format!("[{}] {}", key, label))
            .collect::<Vec<_>>()
            .join("  ");
        self.hint(&choices, inner, buf);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = (message.chars().count() as u16 + 6)
            .clamp(30, 80)
            .min(area.width.saturating_sub(4));
        let inner = self.frame("Error", width, 6, area, buf, true);
        if inner.height == 0 || inner.width == 0 {
            return;
        }
        let body = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
        Paragraph::new(Span::styled(message, Style::default().fg(self.theme.error_fg)))
            .wrap(Wrap { trim: true })
            .render(body, buf);
        self.hint("[Enter/Esc] Dismiss", inner, buf);
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::NewFile => self.render_input("New File", None, area, buf),
            DialogKind::NewFolder => self.render_input("New Folder", None, area, buf),
            DialogKind::Rename { path } => {
                self.render_input(&format!("Rename {}", path), None, area, buf)
            }
            DialogKind::Filter => self.render_input("Filter", None, area, buf),
            DialogKind::Macro { available } => {
                let hint = if available.is_empty() {
                    "name key=value ...".to_string()
                } else {
                    available.join(", ")
                };
                self.render_input("Execute Macro", Some(hint), area, buf)
            }
            DialogKind::Upload => self.render_input("Upload Local File", None, area, buf),
            DialogKind::Decision(prompt) => self.render_decision(prompt, area, buf),
            DialogKind::Error { message } => self.render_error(message, area, buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ide::documents::FallbackAction;

    fn render(mode: AppMode, state: DialogState) -> String {
        let theme = ThemeColors::default();
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        DialogWidget::new(&mode, &state, &theme).render(area, &mut buf);
        buffer_to_string(&buf, area)
    }

    #[test]
    fn input_dialog_renders() {
        let state = DialogState {
            input: "get.hl".to_string(),
            cursor_position: 6,
        };
        let content = render(AppMode::Dialog(DialogKind::NewFile), state);
        assert!(content.contains("New File"));
        assert!(content.contains("get.hl"));
        assert!(content.contains("[Enter] Confirm"));
    }

    #[test]
    fn input_cursor_inside_multibyte_text() {
        let state = DialogState {
            input: "ø.hl".to_string(),
            cursor_position: 0,
        };
        let content = render(AppMode::Dialog(DialogKind::Filter), state);
        assert!(content.contains("ø.hl"));
    }

    #[test]
    fn macro_dialog_lists_available_macros() {
        let mode = AppMode::Dialog(DialogKind::Macro {
            available: vec!["crud".into(), "backup".into()],
        });
        let content = render(mode, DialogState::default());
        assert!(content.contains("Execute Macro"));
        assert!(content.contains("crud, backup"));
    }

    #[test]
    fn delete_prompt_lists_unsaved_documents() {
        let mode = AppMode::Dialog(DialogKind::Decision(Prompt::ConfirmDelete {
            path: "/modules/foo/".into(),
            is_folder: true,
            unsaved: vec!["/modules/foo/a.hl".into()],
        }));
        let content = render(mode, DialogState::default());
        assert!(content.contains("Delete /modules/foo/?"));
        assert!(content.contains("• /modules/foo/a.hl"));
        assert!(content.contains("[y] yes  [n] no"));
    }

    #[test]
    fn unsupported_prompt_shows_offered_actions() {
        let mode = AppMode::Dialog(DialogKind::Decision(Prompt::UnsupportedFile {
            path: "/a.zip".into(),
            actions: vec![FallbackAction::Download, FallbackAction::Unzip],
        }));
        let content = render(mode, DialogState::default());
        assert!(content.contains("Unsupported file"));
        assert!(content.contains("[w]"));
        assert!(content.contains("[z]"));
        assert!(!content.contains("[d]"));
    }

    #[test]
    fn error_dialog_renders() {
        let mode = AppMode::Dialog(DialogKind::Error {
            message: "Access denied: no token".to_string(),
        });
        let content = render(mode, DialogState::default());
        assert!(content.contains("Error"));
        assert!(content.contains("Access denied: no token"));
    }

    #[test]
    fn normal_mode_renders_nothing() {
        let content = render(AppMode::Normal, DialogState::default());
        assert!(content.trim().is_empty());
    }

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }
}
