//! Open documents: at most one entry per path, dirty tracking and the
//! active document.

use std::collections::BTreeSet;

use crate::ide::buffer::TextBuffer;
use crate::ide::paths;

/// A file loaded into an edit buffer.
#[derive(Debug, Clone)]
pub struct OpenDocument {
    pub path: String,
    pub name: String,
    pub folder: String,
    pub buffer: TextBuffer,
    pub dirty: bool,
}

impl OpenDocument {
    pub fn new(path: &str, content: &str) -> Self {
        let mut doc = Self {
            path: String::new(),
            name: String::new(),
            folder: String::new(),
            buffer: TextBuffer::new(content),
            dirty: false,
        };
        doc.set_path(path);
        doc
    }

    fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
        self.name = paths::name_of(path).to_string();
        self.folder = paths::parent_of(path);
    }
}

/// Result of a close attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The document has unsaved changes; nothing was removed.
    NeedsDecision,
    NotOpen,
}

#[derive(Debug, Default)]
pub struct DocumentRegistry {
    docs: Vec<OpenDocument>,
    active: Option<String>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[OpenDocument] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.index_of(path).is_some()
    }

    fn index_of(&self, path: &str) -> Option<usize> {
        self.docs.iter().position(|d| d.path == path)
    }

    pub fn get(&self, path: &str) -> Option<&OpenDocument> {
        self.docs.iter().find(|d| d.path == path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut OpenDocument> {
        self.docs.iter_mut().find(|d| d.path == path)
    }

    pub fn active_path(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&OpenDocument> {
        self.get(self.active.as_deref()?)
    }

    pub fn active_mut(&mut self) -> Option<&mut OpenDocument> {
        let path = self.active.clone()?;
        self.get_mut(&path)
    }

    /// Make `path` the active document. Returns `false` if it is not open.
    pub fn activate(&mut self, path: &str) -> bool {
        if self.is_open(path) {
            self.active = Some(path.to_string());
            true
        } else {
            false
        }
    }

    /// Activate the document `offset` positions away from the active one,
    /// wrapping around.
    pub fn cycle(&mut self, offset: isize) {
        if self.docs.is_empty() {
            return;
        }
        let len = self.docs.len() as isize;
        let current = self
            .active
            .as_deref()
            .and_then(|p| self.index_of(p))
            .unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(len) as usize;
        self.active = Some(self.docs[next].path.clone());
    }

    /// Add a freshly loaded document and activate it. An existing entry for
    /// the same path is activated instead and its buffer kept.
    pub fn insert(&mut self, doc: OpenDocument) {
        let path = doc.path.clone();
        if !self.is_open(&path) {
            self.docs.push(doc);
        }
        self.active = Some(path);
    }

    /// Remove the document unless it is dirty and `force` is not set.
    ///
    /// When the active document goes, the one now at the same index becomes
    /// active, else the previous one, else none.
    pub fn close(&mut self, path: &str, force: bool) -> CloseOutcome {
        let Some(idx) = self.index_of(path) else {
            return CloseOutcome::NotOpen;
        };
        if self.docs[idx].dirty && !force {
            return CloseOutcome::NeedsDecision;
        }
        self.docs.remove(idx);
        if self.active.as_deref() == Some(path) {
            self.active = self
                .docs
                .get(idx)
                .or_else(|| idx.checked_sub(1).and_then(|i| self.docs.get(i)))
                .map(|d| d.path.clone());
        }
        CloseOutcome::Closed
    }

    pub fn mark_dirty(&mut self, path: &str) {
        if let Some(doc) = self.get_mut(path) {
            doc.dirty = true;
        }
    }

    pub fn mark_clean(&mut self, path: &str) {
        if let Some(doc) = self.get_mut(path) {
            doc.buffer.mark_clean();
            doc.dirty = false;
        }
    }

    /// Point the document at `old_path` to `new_path`. Content is untouched.
    /// Refused when `new_path` is already open.
    pub fn rename(&mut self, old_path: &str, new_path: &str) -> bool {
        if self.is_open(new_path) {
            return false;
        }
        let Some(doc) = self.get_mut(old_path) else {
            return false;
        };
        doc.set_path(new_path);
        if self.active.as_deref() == Some(old_path) {
            self.active = Some(new_path.to_string());
        }
        true
    }

    /// Rewrite every document below `old_prefix` to live below `new_prefix`.
    /// Returns how many documents moved.
    pub fn rebase(&mut self, old_prefix: &str, new_prefix: &str) -> usize {
        let mut moved = 0;
        for doc in &mut self.docs {
            if let Some(path) = paths::rebase(&doc.path, old_prefix, new_prefix) {
                doc.set_path(&path);
                moved += 1;
            }
        }
        if let Some(active) = self.active.as_deref() {
            if let Some(path) = paths::rebase(active, old_prefix, new_prefix) {
                self.active = Some(path);
            }
        }
        moved
    }

    /// Dirty documents below `folder`.
    pub fn dirty_under(&self, folder: &str) -> Vec<String> {
        self.docs
            .iter()
            .filter(|d| d.dirty && paths::is_under(&d.path, folder))
            .map(|d| d.path.clone())
            .collect()
    }

    pub fn dirty_paths(&self) -> Vec<String> {
        self.docs
            .iter()
            .filter(|d| d.dirty)
            .map(|d| d.path.clone())
            .collect()
    }

    /// Close every document below `folder`, each with the dirty check of
    /// [`Self::close`]. Returns the dirty paths left open.
    pub fn close_all_under(&mut self, folder: &str, force: bool) -> Vec<String> {
        let targets: Vec<String> = self
            .docs
            .iter()
            .filter(|d| paths::is_under(&d.path, folder))
            .map(|d| d.path.clone())
            .collect();
        targets
            .into_iter()
            .filter(|path| self.close(path, force) == CloseOutcome::NeedsDecision)
            .collect()
    }
}

/// What can be done with a file no editor is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAction {
    Download,
    Delete,
    Unzip,
}

impl FallbackAction {
    pub fn label(self) -> &'static str {
        match self {
            FallbackAction::Download => "download",
            FallbackAction::Delete => "delete",
            FallbackAction::Unzip => "unzip",
        }
    }
}

/// Default extensions with a known editor.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "hl", "sql", "js", "json", "md", "html", "css", "scss", "txt", "yaml", "yml", "xml", "csv",
    "sh", "py", "ts", "toml", "ini",
];

/// Extensions the editor can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypes {
    extensions: BTreeSet<String>,
}

impl Default for FileTypes {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl FileTypes {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn is_supported(&self, path: &str) -> bool {
        paths::extension(path)
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Actions offered for a file that cannot be edited.
    pub fn fallback_actions(path: &str) -> Vec<FallbackAction> {
        let mut actions = vec![FallbackAction::Download, FallbackAction::Delete];
        if paths::extension(path).is_some_and(|e| e.eq_ignore_ascii_case("zip")) {
            actions.push(FallbackAction::Unzip);
        }
        actions
    }
}
