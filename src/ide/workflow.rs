//! Decision points of multi-step operations.
//!
//! An operation that needs the user returns [`Step::Prompt`]; the front end
//! shows the prompt and hands the answer back to
//! [`crate::ide::workspace::Workspace::resume`].

use crate::ide::documents::FallbackAction;

/// A question a pending operation is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Confirm deleting `path`. `unsaved` lists open documents with changes
    /// that would be lost.
    ConfirmDelete {
        path: String,
        is_folder: bool,
        unsaved: Vec<String>,
    },
    /// Save, discard or keep editing before closing `path`.
    UnsavedChanges { path: String },
    /// `path` has no editor; pick one of `actions` or cancel.
    UnsupportedFile {
        path: String,
        actions: Vec<FallbackAction>,
    },
}

impl Prompt {
    pub fn path(&self) -> &str {
        match self {
            Prompt::ConfirmDelete { path, .. }
            | Prompt::UnsavedChanges { path }
            | Prompt::UnsupportedFile { path, .. } => path,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Prompt::ConfirmDelete { .. } => "Delete",
            Prompt::UnsavedChanges { .. } => "Unsaved changes",
            Prompt::UnsupportedFile { .. } => "Unsupported file",
        }
    }

    /// Question shown in the dialog body.
    pub fn message(&self) -> String {
        match self {
            Prompt::ConfirmDelete {
                path,
                unsaved,
                ..
            } if !unsaved.is_empty() => format!(
                "Delete {}? {} open document(s) have unsaved changes.",
                path,
                unsaved.len()
            ),
            Prompt::ConfirmDelete { path, .. } => format!("Delete {}?", path),
            Prompt::UnsavedChanges { path } => format!("{} has unsaved changes.", path),
            Prompt::UnsupportedFile { path, .. } => {
                format!("{} cannot be opened in the editor.", path)
            }
        }
    }

    /// Decisions this prompt accepts, with their key and label.
    pub fn choices(&self) -> Vec<(char, &'static str, Decision)> {
        match self {
            Prompt::ConfirmDelete { .. } => vec![
                ('y', "yes", Decision::Confirm),
                ('n', "no", Decision::Cancel),
            ],
            Prompt::UnsavedChanges { .. } => vec![
                ('s', "save", Decision::Save),
                ('d', "discard", Decision::Discard),
                ('c', "cancel", Decision::Cancel),
            ],
            Prompt::UnsupportedFile { actions, .. } => actions
                .iter()
                .map(|&a| (fallback_key(a), a.label(), Decision::Fallback(a)))
                .chain(std::iter::once(('c', "cancel", Decision::Cancel)))
                .collect(),
        }
    }

    /// The decision bound to `key`, if any.
    pub fn decision_for(&self, key: char) -> Option<Decision> {
        let key = key.to_ascii_lowercase();
        self.choices()
            .into_iter()
            .find(|(k, _, _)| *k == key)
            .map(|(_, _, d)| d)
    }

    /// Whether `decision` answers this prompt.
    pub fn accepts(&self, decision: Decision) -> bool {
        decision == Decision::Cancel || self.choices().iter().any(|(_, _, d)| *d == decision)
    }
}

fn fallback_key(action: FallbackAction) -> char {
    match action {
        FallbackAction::Download => 'w',
        FallbackAction::Delete => 'd',
        FallbackAction::Unzip => 'z',
    }
}

/// The user's answer to a [`Prompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Cancel,
    Save,
    Discard,
    Fallback(FallbackAction),
}

/// Where an operation stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Done,
    Prompt(Prompt),
}

impl Step {
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done)
    }
}
