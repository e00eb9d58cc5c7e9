use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode, Focus};
use crate::components::dialog::DialogWidget;
use crate::components::editor::EditorWidget;
use crate::components::status_bar::{StatusBarWidget, EDITOR_HINTS, TREE_HINTS};
use crate::components::tree::TreeWidget;
use crate::theme::ThemeColors;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let theme = ThemeColors::default();
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(outer[0]);

    // Keep selection and cursor in view; both panels have a one-cell border.
    let tree_height = panels[0].height.saturating_sub(2) as usize;
    app.workspace.projection_mut().update_scroll(tree_height);
    app.editor_height = EditorWidget::text_height(panels[1].height.saturating_sub(2));
    let editor_height = app.editor_height;
    if let Some(doc) = app.workspace.active_document_mut() {
        doc.buffer.ensure_cursor_visible(editor_height);
    }

    let border = |focused: bool| {
        let color = if focused {
            theme.border_focused_fg
        } else {
            theme.border_fg
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
    };

    let filter = app.workspace.projection().filter();
    let tree_title = if filter.is_empty() {
        " Files ".to_string()
    } else {
        format!(" Files [{}] ", filter)
    };
    let tree = TreeWidget::new(
        app.workspace.projection(),
        app.workspace.endpoints(),
        &theme,
    )
    .block(border(app.focus == Focus::Tree).title(tree_title));
    frame.render_widget(tree, panels[0]);

    let editor_title = match app.workspace.active_document() {
        Some(doc) => format!(" {} ", doc.path),
        None => " Editor ".to_string(),
    };
    let editor = EditorWidget::new(
        app.workspace.documents(),
        &theme,
        app.focus == Focus::Editor,
    )
    .block(border(app.focus == Focus::Editor).title(editor_title));
    frame.render_widget(editor, panels[1]);

    let dirty = app.workspace.dirty_documents().len();
    let info = format!("{} open, {} unsaved", app.workspace.documents().len(), dirty);
    let hints = match app.focus {
        Focus::Tree => TREE_HINTS,
        Focus::Editor => EDITOR_HINTS,
    };
    let mut status = StatusBarWidget::new(app.workspace.active_folder(), &info, &theme)
        .key_hints(hints);
    if let Some(msg) = &app.status_message {
        status = status.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(status, outer[1]);

    if let AppMode::Dialog(_) = app.mode {
        frame.render_widget(
            DialogWidget::new(&app.mode, &app.dialog_state, &theme),
            frame.area(),
        );
    }
}
