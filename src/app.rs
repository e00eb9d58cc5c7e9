use std::path::Path;
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::ide::buffer::TextBuffer;
use crate::ide::macros::{self, MacroOutcome};
use crate::ide::paths;
use crate::ide::{Decision, Prompt, Step, Workspace};

/// Seconds a status message stays on screen.
const STATUS_TTL_SECS: u64 = 4;

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    NewFile,
    NewFolder,
    Rename { path: String },
    Filter,
    /// `available` lists macro names for the hint line.
    Macro { available: Vec<String> },
    Upload,
    /// A pending operation waiting for the user's decision.
    Decision(Prompt),
    Error { message: String },
}

impl DialogKind {
    /// Whether the dialog has a text input line.
    pub fn has_input(&self) -> bool {
        !matches!(self, DialogKind::Decision(_) | DialogKind::Error { .. })
    }
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
}

/// Which panel receives keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Tree,
    Editor,
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    /// Byte offset into `input`.
    pub cursor_position: usize,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Buffer edits bound to editor keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommand {
    Insert(char),
    Newline,
    Backspace,
    Delete,
    Indent,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Undo,
    Redo,
}

/// Work requested by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    ForceQuit,
    SelectNext,
    SelectPrevious,
    SelectFirst,
    SelectLast,
    /// Open the selected file or toggle the selected folder.
    OpenSelected,
    /// Collapse the selected folder, or move to its parent.
    CollapseSelected,
    NewFile,
    NewFolder,
    Rename,
    Delete,
    Filter,
    Macro,
    Upload,
    Unzip,
    Download,
    Reload,
    Save,
    CloseDocument,
    NextDocument,
    PreviousDocument,
    FocusEditor,
    FocusTree,
    Edit(EditCommand),
    SubmitDialog,
    CancelDialog,
    Decide(Decision),
}

/// Main application state.
pub struct App {
    pub workspace: Workspace,
    pub mode: AppMode,
    pub focus: Focus,
    pub dialog_state: DialogState,
    pub status_message: Option<StatusMessage>,
    pub tab_width: usize,
    /// Rows available to the editor, updated on render.
    pub editor_height: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(workspace: Workspace, tab_width: usize) -> Self {
        Self {
            workspace,
            mode: AppMode::Normal,
            focus: Focus::Tree,
            dialog_state: DialogState::default(),
            status_message: None,
            tab_width,
            editor_height: 0,
            should_quit: false,
        }
    }

    // ── Dialogs ──────────────────────────────────────────────────────────

    /// Open a dialog of the given kind, prefilling the input where it helps.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        let prefill = match &kind {
            DialogKind::Rename { path } => Some(paths::name_of(path).to_string()),
            DialogKind::Filter => Some(self.workspace.projection().filter().to_string()),
            _ => None,
        };
        if let Some(text) = prefill {
            self.dialog_state.cursor_position = text.len();
            self.dialog_state.input = text;
        }
        self.mode = AppMode::Dialog(kind);
    }

    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let before = &self.dialog_state.input[..self.dialog_state.cursor_position];
        if let Some(prev) = before.chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    pub fn dialog_move_cursor_left(&mut self) {
        let before = &self.dialog_state.input[..self.dialog_state.cursor_position];
        if let Some(prev) = before.chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    pub fn dialog_move_cursor_right(&mut self) {
        let after = &self.dialog_state.input[self.dialog_state.cursor_position..];
        if let Some(next) = after.chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Status ───────────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            created: Instant::now(),
        });
    }

    /// Clear the status message once it has been shown long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some(msg) = &self.status_message {
            if msg.created.elapsed().as_secs() > STATUS_TTL_SECS {
                self.status_message = None;
            }
        }
    }

    /// The single sink for failed actions: log, show the error dialog and
    /// keep the message in the status bar.
    pub fn report_error(&mut self, err: AppError) {
        let message = err.to_string();
        match err {
            AppError::Validation(_) | AppError::ProtectedPath(_) => {
                tracing::info!(error = %message, "action rejected");
            }
            _ => tracing::warn!(error = %message, "action failed"),
        }
        self.status_message = Some(StatusMessage {
            text: message.clone(),
            is_error: true,
            created: Instant::now(),
        });
        self.open_dialog(DialogKind::Error { message });
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Run `action`, routing any failure to [`Self::report_error`].
    pub async fn perform(&mut self, action: Action) {
        if let Err(e) = self.run(action).await {
            self.report_error(e);
        }
    }

    async fn run(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                let dirty = self.workspace.dirty_documents();
                if dirty.is_empty() {
                    self.quit();
                } else {
                    self.set_status_message(format!(
                        "{} unsaved document(s); save them or press Q to quit anyway",
                        dirty.len()
                    ));
                }
            }
            Action::ForceQuit => self.quit(),
            Action::SelectNext => {
                self.workspace.projection_mut().select_next();
                self.sync_active_folder();
            }
            Action::SelectPrevious => {
                self.workspace.projection_mut().select_previous();
                self.sync_active_folder();
            }
            Action::SelectFirst => {
                self.workspace.projection_mut().select_first();
                self.sync_active_folder();
            }
            Action::SelectLast => {
                self.workspace.projection_mut().select_last();
                self.sync_active_folder();
            }
            Action::OpenSelected => self.open_selected().await?,
            Action::CollapseSelected => self.collapse_selected(),
            Action::NewFile => self.open_dialog(DialogKind::NewFile),
            Action::NewFolder => self.open_dialog(DialogKind::NewFolder),
            Action::Rename => {
                let path = self.require_selection()?;
                self.open_dialog(DialogKind::Rename { path });
            }
            Action::Delete => {
                let path = self.require_selection()?;
                let step = self.workspace.delete(&path, false).await?;
                self.follow(step, format!("Deleted {}", path));
            }
            Action::Filter => self.open_dialog(DialogKind::Filter),
            Action::Macro => {
                let available = match self.workspace.list_macros().await {
                    Ok(names) => names,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not list macros");
                        Vec::new()
                    }
                };
                self.open_dialog(DialogKind::Macro { available });
            }
            Action::Upload => self.open_dialog(DialogKind::Upload),
            Action::Unzip => {
                let path = self.require_selection()?;
                self.workspace.unzip(&path).await?;
                self.set_status_message(format!("Unzipped {}", path));
            }
            Action::Download => {
                let path = self.require_selection()?;
                let target = self.workspace.download(&path).await?;
                self.set_status_message(format!("Downloaded to {}", target.display()));
            }
            Action::Reload => {
                self.workspace.reload_all().await?;
                self.set_status_message("Reloaded");
            }
            Action::Save => {
                if let Some(path) = self.active_path() {
                    self.workspace.save(&path).await?;
                    self.set_status_message(format!("Saved {}", path));
                }
            }
            Action::CloseDocument => {
                if let Some(path) = self.active_path() {
                    let step = self.workspace.close(&path, false)?;
                    self.follow(step, format!("Closed {}", path));
                    self.ensure_focus();
                }
            }
            Action::NextDocument => self.workspace.cycle_document(1),
            Action::PreviousDocument => self.workspace.cycle_document(-1),
            Action::FocusEditor => {
                if self.workspace.active_document().is_some() {
                    self.focus = Focus::Editor;
                }
            }
            Action::FocusTree => self.focus = Focus::Tree,
            Action::Edit(command) => self.edit(command),
            Action::SubmitDialog => self.submit_dialog().await?,
            Action::CancelDialog => self.close_dialog(),
            Action::Decide(decision) => {
                let AppMode::Dialog(DialogKind::Decision(prompt)) = &self.mode else {
                    return Ok(());
                };
                let prompt = prompt.clone();
                if !prompt.accepts(decision) {
                    return Ok(());
                }
                self.close_dialog();
                let done = decision_message(&prompt, decision);
                let step = self.workspace.resume(prompt, decision).await?;
                self.follow(step, done);
                self.ensure_focus();
            }
        }
        Ok(())
    }

    /// Show the next prompt, or `done` when the operation finished.
    fn follow(&mut self, step: Step, done: String) {
        match step {
            Step::Done => {
                if !done.is_empty() {
                    self.set_status_message(done);
                }
            }
            Step::Prompt(prompt) => self.open_dialog(DialogKind::Decision(prompt)),
        }
    }

    fn active_path(&self) -> Option<String> {
        self.workspace.documents().active_path().map(str::to_string)
    }

    fn require_selection(&self) -> Result<String> {
        self.workspace
            .selected_path()
            .ok_or_else(|| AppError::NotFound("nothing selected".into()))
    }

    /// Folder rows become the active folder; file rows make their parent it.
    fn sync_active_folder(&mut self) {
        if let Some(path) = self.workspace.selected_path() {
            let folder = if paths::is_folder(&path) {
                path
            } else {
                paths::parent_of(&path)
            };
            self.workspace.select_folder(&folder);
        }
    }

    fn is_filtering(&self) -> bool {
        !self.workspace.projection().filter().is_empty()
    }

    fn ensure_focus(&mut self) {
        if self.workspace.active_document().is_none() {
            self.focus = Focus::Tree;
        }
    }

    async fn open_selected(&mut self) -> Result<()> {
        let Some(node) = self.workspace.projection().selected_node().cloned() else {
            return Ok(());
        };
        if node.expandable {
            if self.is_filtering() {
                // Every folder is shown expanded while filtering; only list it.
                self.workspace.expand(&node.path).await?;
                self.set_status_message("Clear the filter to collapse folders");
            } else if self.workspace.projection().is_expanded(&node.path) {
                self.workspace.collapse(&node.path);
            } else {
                self.workspace.expand(&node.path).await?;
            }
            return Ok(());
        }
        match self.workspace.open(&node.path).await? {
            Step::Done => self.focus = Focus::Editor,
            Step::Prompt(prompt) => self.open_dialog(DialogKind::Decision(prompt)),
        }
        Ok(())
    }

    fn collapse_selected(&mut self) {
        let Some(node) = self.workspace.projection().selected_node().cloned() else {
            return;
        };
        if node.expandable
            && !self.is_filtering()
            && self.workspace.projection().is_expanded(&node.path)
        {
            self.workspace.collapse(&node.path);
        } else {
            let parent = paths::parent_of(&node.path);
            if parent != paths::ROOT {
                self.workspace.projection_mut().select_path(&parent);
                self.sync_active_folder();
            }
        }
    }

    fn edit(&mut self, command: EditCommand) {
        let tab_width = self.tab_width;
        let height = self.editor_height;
        self.workspace.edit(|buffer| {
            apply_edit(buffer, command, tab_width);
            buffer.ensure_cursor_visible(height);
        });
    }

    async fn submit_dialog(&mut self) -> Result<()> {
        let AppMode::Dialog(kind) = std::mem::take(&mut self.mode) else {
            return Ok(());
        };
        let input = std::mem::take(&mut self.dialog_state.input);
        self.close_dialog();
        let input = input.trim();

        match kind {
            DialogKind::NewFile => {
                match self.workspace.create(input, false, true).await? {
                    Step::Done => self.focus = Focus::Editor,
                    Step::Prompt(prompt) => self.open_dialog(DialogKind::Decision(prompt)),
                }
            }
            DialogKind::NewFolder => {
                let step = self.workspace.create(input, true, false).await?;
                self.follow(step, format!("Created folder {}", input));
            }
            DialogKind::Rename { path } => {
                self.workspace.rename(&path, input).await?;
                self.set_status_message(format!("Renamed {} to {}", path, input));
            }
            DialogKind::Filter => self.workspace.set_filter(input),
            DialogKind::Macro { .. } => {
                let (name, args) = macros::parse_invocation(input)?;
                let outcome = self.workspace.execute_macro(&name, args).await?;
                let message = match outcome {
                    MacroOutcome::Success => format!("Macro {} executed", name),
                    MacroOutcome::RefreshFolder(folder) => {
                        format!("Macro {} executed, reloaded {}", name, folder)
                    }
                    MacroOutcome::RefreshAll => format!("Macro {} executed, reloaded all", name),
                };
                self.set_status_message(message);
            }
            DialogKind::Upload => {
                let remote = self.workspace.upload(Path::new(input)).await?;
                self.set_status_message(format!("Uploaded {}", remote));
            }
            DialogKind::Decision(_) | DialogKind::Error { .. } => {}
        }
        Ok(())
    }
}

/// Status text once `decision` has been applied to `prompt`.
fn decision_message(prompt: &Prompt, decision: Decision) -> String {
    match decision {
        Decision::Cancel => String::new(),
        Decision::Confirm => format!("Deleted {}", prompt.path()),
        Decision::Save => format!("Saved and closed {}", prompt.path()),
        Decision::Discard => format!("Discarded changes to {}", prompt.path()),
        Decision::Fallback(action) => format!("{}: {}", action.label(), prompt.path()),
    }
}

fn apply_edit(buffer: &mut TextBuffer, command: EditCommand, tab_width: usize) {
    match command {
        EditCommand::Insert(c) => buffer.insert_char(c),
        EditCommand::Newline => buffer.insert_newline(),
        EditCommand::Backspace => buffer.delete_char_before(),
        EditCommand::Delete => buffer.delete_char_at(),
        EditCommand::Indent => buffer.insert_str(&" ".repeat(tab_width)),
        EditCommand::Left => buffer.move_left(),
        EditCommand::Right => buffer.move_right(),
        EditCommand::Up => buffer.move_up(),
        EditCommand::Down => buffer.move_down(),
        EditCommand::Home => buffer.move_home(),
        EditCommand::End => buffer.move_end(),
        EditCommand::Undo => buffer.undo(),
        EditCommand::Redo => buffer.redo(),
    }
}
