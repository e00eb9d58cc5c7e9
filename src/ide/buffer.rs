/// A single reversible edit.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EditAction {
    /// A character was inserted at (line, col).
    InsertChar { line: usize, col: usize, ch: char },
    /// A character was deleted at (line, col).
    DeleteChar { line: usize, col: usize, ch: char },
    /// A line was split at (line, col).
    SplitLine { line: usize, col: usize },
    /// Line `line + 1` was appended to `line`, which was `col` chars long.
    JoinLine { line: usize, col: usize },
}

/// Maximum entries in the undo stack.
const MAX_UNDO_ENTRIES: usize = 1000;

/// Line-oriented edit buffer with undo/redo and a clean marker.
///
/// The clean marker is the undo position of the last load or save. The buffer
/// is clean exactly when the undo position is back at that marker, so typing
/// and undoing the same text leaves it clean without comparing contents.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    pub cursor_line: usize,
    /// Cursor column in chars.
    pub cursor_col: usize,
    pub scroll_offset: usize,
    undo_stack: Vec<EditAction>,
    undo_index: usize,
    /// `None` once the saved state fell off the undo stack or was overwritten.
    clean_index: Option<usize>,
}

impl TextBuffer {
    pub fn new(content: &str) -> Self {
        Self {
            lines: content.split('\n').map(String::from).collect(),
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            undo_stack: Vec::new(),
            undo_index: 0,
            clean_index: Some(0),
        }
    }

    /// Full text; a trailing newline in the loaded content is preserved.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_index)
    }

    /// Record the current state as persisted.
    pub fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_index);
    }

    fn current_line_len(&self) -> usize {
        self.lines
            .get(self.cursor_line)
            .map(|l| l.chars().count())
            .unwrap_or(0)
    }

    fn clamp_cursor(&mut self) {
        if self.cursor_line >= self.lines.len() {
            self.cursor_line = self.lines.len().saturating_sub(1);
        }
        let len = self.current_line_len();
        if self.cursor_col > len {
            self.cursor_col = len;
        }
    }

    /// Keep the cursor inside a viewport of `height` lines.
    pub fn ensure_cursor_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        } else if self.cursor_line >= self.scroll_offset + height {
            self.scroll_offset = self.cursor_line + 1 - height;
        }
    }

    // ── Undo infrastructure ───────────────────────────────────────────

    fn record(&mut self, action: EditAction) {
        // A redo branch that contained the saved state is gone for good.
        if matches!(self.clean_index, Some(idx) if idx > self.undo_index) {
            self.clean_index = None;
        }
        self.undo_stack.truncate(self.undo_index);
        self.undo_stack.push(action);
        self.undo_index = self.undo_stack.len();
        if self.undo_stack.len() > MAX_UNDO_ENTRIES {
            let excess = self.undo_stack.len() - MAX_UNDO_ENTRIES;
            self.undo_stack.drain(..excess);
            self.undo_index = self.undo_stack.len();
            self.clean_index = self
                .clean_index
                .and_then(|idx| idx.checked_sub(excess));
        }
    }

    // ── Mutations ─────────────────────────────────────────────────────

    pub fn insert_char(&mut self, ch: char) {
        let (line, col) = (self.cursor_line, self.cursor_col);
        self.raw_insert(line, col, ch);
        self.cursor_col += 1;
        self.record(EditAction::InsertChar { line, col, ch });
    }

    pub fn insert_str(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.insert_newline();
            } else {
                self.insert_char(ch);
            }
        }
    }

    pub fn insert_newline(&mut self) {
        let (line, col) = (self.cursor_line, self.cursor_col);
        self.raw_split(line, col);
        self.cursor_line += 1;
        self.cursor_col = 0;
        self.record(EditAction::SplitLine { line, col });
    }

    /// Backspace: delete before the cursor, joining lines at column 0.
    pub fn delete_char_before(&mut self) {
        if self.cursor_col > 0 {
            let (line, col) = (self.cursor_line, self.cursor_col - 1);
            if let Some(ch) = self.raw_remove(line, col) {
                self.cursor_col = col;
                self.record(EditAction::DeleteChar { line, col, ch });
            }
        } else if self.cursor_line > 0 {
            let line = self.cursor_line - 1;
            let col = self.lines[line].chars().count();
            self.raw_join(line);
            self.cursor_line = line;
            self.cursor_col = col;
            self.record(EditAction::JoinLine { line, col });
        }
    }

    /// Delete key: delete at the cursor, joining the next line at line end.
    pub fn delete_char_at(&mut self) {
        let (line, col) = (self.cursor_line, self.cursor_col);
        if col < self.current_line_len() {
            if let Some(ch) = self.raw_remove(line, col) {
                self.record(EditAction::DeleteChar { line, col, ch });
            }
        } else if line + 1 < self.lines.len() {
            self.raw_join(line);
            self.record(EditAction::JoinLine { line, col });
        }
    }

    pub fn undo(&mut self) {
        if self.undo_index == 0 {
            return;
        }
        self.undo_index -= 1;
        let action = self.undo_stack[self.undo_index].clone();
        self.apply_reverse(&action);
    }

    pub fn redo(&mut self) {
        if self.undo_index >= self.undo_stack.len() {
            return;
        }
        let action = self.undo_stack[self.undo_index].clone();
        self.apply_forward(&action);
        self.undo_index += 1;
    }

    fn apply_reverse(&mut self, action: &EditAction) {
        match *action {
            EditAction::InsertChar { line, col, .. } => {
                self.raw_remove(line, col);
                self.set_cursor(line, col);
            }
            EditAction::DeleteChar { line, col, ch } => {
                self.raw_insert(line, col, ch);
                self.set_cursor(line, col + 1);
            }
            EditAction::SplitLine { line, col } => {
                self.raw_join(line);
                self.set_cursor(line, col);
            }
            EditAction::JoinLine { line, col } => {
                self.raw_split(line, col);
                self.set_cursor(line + 1, 0);
            }
        }
    }

    fn apply_forward(&mut self, action: &EditAction) {
        match *action {
            EditAction::InsertChar { line, col, ch } => {
                self.raw_insert(line, col, ch);
                self.set_cursor(line, col + 1);
            }
            EditAction::DeleteChar { line, col, .. } => {
                self.raw_remove(line, col);
                self.set_cursor(line, col);
            }
            EditAction::SplitLine { line, col } => {
                self.raw_split(line, col);
                self.set_cursor(line + 1, 0);
            }
            EditAction::JoinLine { line, col } => {
                self.raw_join(line);
                self.set_cursor(line, col);
            }
        }
    }

    fn set_cursor(&mut self, line: usize, col: usize) {
        self.cursor_line = line;
        self.cursor_col = col;
        self.clamp_cursor();
    }

    fn raw_insert(&mut self, line: usize, col: usize, ch: char) {
        if let Some(l) = self.lines.get_mut(line) {
            let idx = char_to_byte_index(l, col);
            l.insert(idx, ch);
        }
    }

    fn raw_remove(&mut self, line: usize, col: usize) -> Option<char> {
        let l = self.lines.get_mut(line)?;
        let idx = char_to_byte_index(l, col);
        if idx < l.len() {
            Some(l.remove(idx))
        } else {
            None
        }
    }

    fn raw_split(&mut self, line: usize, col: usize) {
        if let Some(l) = self.lines.get_mut(line) {
            let idx = char_to_byte_index(l, col);
            let rest = l.split_off(idx);
            self.lines.insert(line + 1, rest);
        }
    }

    fn raw_join(&mut self, line: usize) {
        if line + 1 < self.lines.len() {
            let next = self.lines.remove(line + 1);
            self.lines[line].push_str(&next);
        }
    }

    // ── Navigation ────────────────────────────────────────────────────

    pub fn move_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.clamp_cursor();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.clamp_cursor();
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.current_line_len();
    }
}

/// Convert a char index to a byte index within `s`, clamped to `s.len()`.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips_trailing_newline() {
        assert_eq!(TextBuffer::new("a\nb\n").text(), "a\nb\n");
        assert_eq!(TextBuffer::new("a\nb").text(), "a\nb");
        assert_eq!(TextBuffer::new("").line_count(), 1);
    }

    #[test]
    fn new_buffer_is_clean() {
        assert!(TextBuffer::new("x").is_clean());
    }

    #[test]
    fn edits_make_buffer_dirty() {
        let mut buf = TextBuffer::new("abc");
        buf.move_end();
        buf.insert_char('d');
        assert_eq!(buf.text(), "abcd");
        assert!(!buf.is_clean());
    }

    #[test]
    fn undo_back_to_saved_state_is_clean() {
        let mut buf = TextBuffer::new("abc");
        buf.insert_char('x');
        buf.insert_char('y');
        assert!(!buf.is_clean());
        buf.undo();
        buf.undo();
        assert_eq!(buf.text(), "abc");
        assert!(buf.is_clean());
        buf.redo();
        assert!(!buf.is_clean());
    }

    #[test]
    fn same_text_through_different_edits_is_still_dirty() {
        let mut buf = TextBuffer::new("abc");
        buf.insert_char('x');
        buf.delete_char_before();
        assert_eq!(buf.text(), "abc");
        assert!(!buf.is_clean());
    }

    #[test]
    fn mark_clean_after_save() {
        let mut buf = TextBuffer::new("abc");
        buf.insert_char('x');
        buf.mark_clean();
        assert!(buf.is_clean());
        buf.undo();
        assert!(!buf.is_clean());
        buf.redo();
        assert!(buf.is_clean());
    }

    #[test]
    fn new_edit_after_undo_discards_saved_branch() {
        let mut buf = TextBuffer::new("");
        buf.insert_char('a');
        buf.mark_clean();
        buf.undo();
        buf.insert_char('b');
        buf.delete_char_before();
        buf.insert_char('a');
        assert_eq!(buf.text(), "a");
        assert!(!buf.is_clean());
    }

    #[test]
    fn newline_and_join_undo() {
        let mut buf = TextBuffer::new("hello");
        buf.cursor_col = 2;
        buf.insert_newline();
        assert_eq!(buf.lines(), &["he".to_string(), "llo".to_string()]);
        assert_eq!((buf.cursor_line, buf.cursor_col), (1, 0));

        buf.delete_char_before();
        assert_eq!(buf.text(), "hello");
        assert_eq!((buf.cursor_line, buf.cursor_col), (0, 2));

        buf.undo();
        assert_eq!(buf.text(), "he\nllo");
        buf.undo();
        assert_eq!(buf.text(), "hello");
        assert!(buf.is_clean());
    }

    #[test]
    fn delete_at_line_end_joins() {
        let mut buf = TextBuffer::new("ab\ncd");
        buf.move_end();
        buf.delete_char_at();
        assert_eq!(buf.text(), "abcd");
        buf.undo();
        assert_eq!(buf.text(), "ab\ncd");
    }

    #[test]
    fn multibyte_chars() {
        let mut buf = TextBuffer::new("æø");
        buf.move_end();
        buf.insert_char('å');
        assert_eq!(buf.text(), "æøå");
        buf.move_left();
        buf.delete_char_before();
        assert_eq!(buf.text(), "æå");
    }

    #[test]
    fn navigation_clamps() {
        let mut buf = TextBuffer::new("long line\nab");
        buf.move_end();
        buf.move_down();
        assert_eq!((buf.cursor_line, buf.cursor_col), (1, 2));
        buf.move_right();
        assert_eq!((buf.cursor_line, buf.cursor_col), (1, 2));
        buf.move_home();
        buf.move_left();
        assert_eq!((buf.cursor_line, buf.cursor_col), (0, 9));
    }

    #[test]
    fn insert_str_handles_newlines() {
        let mut buf = TextBuffer::new("");
        buf.insert_str("a\nb");
        assert_eq!(buf.text(), "a\nb");
        assert_eq!(buf.cursor_line, 1);
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut buf = TextBuffer::new(&"x\n".repeat(50));
        buf.cursor_line = 30;
        buf.ensure_cursor_visible(10);
        assert_eq!(buf.scroll_offset, 21);
        buf.cursor_line = 5;
        buf.ensure_cursor_visible(10);
        assert_eq!(buf.scroll_offset, 5);
    }

    #[test]
    fn char_to_byte_index_past_end() {
        assert_eq!(char_to_byte_index("abc", 10), 3);
        assert_eq!(char_to_byte_index("æb", 1), 2);
    }
}
