use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{Action, App, AppMode, DialogKind, EditCommand, Focus};

/// Translate a key press into an [`Action`].
///
/// Text entry inside dialogs is applied directly to the dialog state; only
/// keys that need the workspace produce an action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::ForceQuit);
    }
    match &app.mode {
        AppMode::Dialog(kind) => {
            let kind = kind.clone();
            handle_dialog_key(app, &kind, key)
        }
        AppMode::Normal => {
            if let Some(action) = handle_global_key(key) {
                return Some(action);
            }
            match app.focus {
                Focus::Tree => handle_tree_key(key),
                Focus::Editor => handle_editor_key(key),
            }
        }
    }
}

/// Keys that work with either panel focused.
fn handle_global_key(key: KeyEvent) -> Option<Action> {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('s') => Some(Action::Save),
        KeyCode::Char('w') => Some(Action::CloseDocument),
        _ => None,
    }
}

fn handle_tree_key(key: KeyEvent) -> Option<Action> {
    let action = match key.code {
        KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
        KeyCode::Up | KeyCode::Char('k') => Action::SelectPrevious,
        KeyCode::Char('g') | KeyCode::Home => Action::SelectFirst,
        KeyCode::Char('G') | KeyCode::End => Action::SelectLast,
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => Action::OpenSelected,
        KeyCode::Left | KeyCode::Char('h') => Action::CollapseSelected,
        KeyCode::Char('a') => Action::NewFile,
        KeyCode::Char('A') => Action::NewFolder,
        KeyCode::Char('r') => Action::Rename,
        KeyCode::Char('d') | KeyCode::Delete => Action::Delete,
        KeyCode::Char('/') => Action::Filter,
        KeyCode::Char('m') => Action::Macro,
        KeyCode::Char('u') => Action::Upload,
        KeyCode::Char('z') => Action::Unzip,
        KeyCode::Char('D') => Action::Download,
        KeyCode::Char('R') => Action::Reload,
        KeyCode::Char('[') => Action::PreviousDocument,
        KeyCode::Char(']') => Action::NextDocument,
        KeyCode::Tab => Action::FocusEditor,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('Q') => Action::ForceQuit,
        _ => return None,
    };
    Some(action)
}

fn handle_editor_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('z') => Some(Action::Edit(EditCommand::Undo)),
            KeyCode::Char('y') => Some(Action::Edit(EditCommand::Redo)),
            _ => None,
        };
    }
    let command = match key.code {
        KeyCode::Esc => return Some(Action::FocusTree),
        KeyCode::Char(c) => EditCommand::Insert(c),
        KeyCode::Enter => EditCommand::Newline,
        KeyCode::Backspace => EditCommand::Backspace,
        KeyCode::Delete => EditCommand::Delete,
        KeyCode::Tab => EditCommand::Indent,
        KeyCode::Left => EditCommand::Left,
        KeyCode::Right => EditCommand::Right,
        KeyCode::Up => EditCommand::Up,
        KeyCode::Down => EditCommand::Down,
        KeyCode::Home => EditCommand::Home,
        KeyCode::End => EditCommand::End,
        _ => return None,
    };
    Some(Action::Edit(command))
}

fn handle_dialog_key(app: &mut App, kind: &DialogKind, key: KeyEvent) -> Option<Action> {
    match kind {
        DialogKind::Error { .. } => match key.code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::CancelDialog),
            _ => None,
        },
        DialogKind::Decision(prompt) => match key.code {
            KeyCode::Esc => Some(Action::CancelDialog),
            KeyCode::Char(c) => prompt
                .decision_for(c.to_ascii_lowercase())
                .map(Action::Decide),
            _ => None,
        },
        _ => {
            match key.code {
                KeyCode::Enter => return Some(Action::SubmitDialog),
                KeyCode::Esc => return Some(Action::CancelDialog),
                KeyCode::Char(c) => app.dialog_input_char(c),
                KeyCode::Backspace => app.dialog_delete_char(),
                KeyCode::Left => app.dialog_move_cursor_left(),
                KeyCode::Right => app.dialog_move_cursor_right(),
                KeyCode::Home => app.dialog_cursor_home(),
                KeyCode::End => app.dialog_cursor_end(),
                _ => {}
            }
            None
        }
    }
}
