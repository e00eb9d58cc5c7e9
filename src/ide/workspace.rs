//! The IDE session: tree, projection and open documents kept consistent with
//! the remote store.
//!
//! Every mutation calls the store first and touches local state only after
//! the call succeeded. Mutations take `&mut self`, so one finishes its local
//! update before the next starts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::ide::buffer::TextBuffer;
use crate::ide::documents::{
    CloseOutcome, DocumentRegistry, FallbackAction, FileTypes, OpenDocument,
};
use crate::ide::endpoints::EndpointIndex;
use crate::ide::macros::{self, MacroOutcome};
use crate::ide::paths;
use crate::ide::projection::Projection;
use crate::ide::tree::{TreeNode, TreeStore};
use crate::ide::workflow::{Decision, Prompt, Step};
use crate::store::{FileStore, ListOptions};

/// Behavior switches for a workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    /// List backend-owned folders such as `/system/`.
    pub include_system: bool,
    /// Ask before deleting. Deletes that lose unsaved changes always ask.
    pub confirm_delete: bool,
    /// Value for `auth`/`role`/`roles` macro arguments.
    pub default_role: String,
    pub file_types: FileTypes,
    pub download_dir: PathBuf,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            include_system: false,
            confirm_delete: true,
            default_role: macros::DEFAULT_ROLE.to_string(),
            file_types: FileTypes::default(),
            download_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug)]
pub struct Workspace {
    store: Arc<dyn FileStore>,
    tree: TreeStore,
    projection: Projection,
    documents: DocumentRegistry,
    active_folder: String,
    endpoints: EndpointIndex,
    options: WorkspaceOptions,
}

impl Workspace {
    pub fn new(store: Arc<dyn FileStore>, options: WorkspaceOptions) -> Self {
        Self {
            store,
            tree: TreeStore::new(),
            projection: Projection::default(),
            documents: DocumentRegistry::new(),
            active_folder: paths::ROOT.to_string(),
            endpoints: EndpointIndex::default(),
            options,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn tree(&self) -> &TreeStore {
        &self.tree
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_mut(&mut self) -> &mut Projection {
        &mut self.projection
    }

    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    pub fn active_document(&self) -> Option<&OpenDocument> {
        self.documents.active()
    }

    pub fn active_document_mut(&mut self) -> Option<&mut OpenDocument> {
        self.documents.active_mut()
    }

    pub fn active_folder(&self) -> &str {
        &self.active_folder
    }

    pub fn endpoints(&self) -> &EndpointIndex {
        &self.endpoints
    }

    pub fn options(&self) -> &WorkspaceOptions {
        &self.options
    }

    /// Path of the selected tree row.
    pub fn selected_path(&self) -> Option<String> {
        self.projection.selected_node().map(|n| n.path.clone())
    }

    fn list_options(&self, recursive: bool) -> ListOptions {
        ListOptions {
            recursive,
            include_system: self.options.include_system,
        }
    }

    fn rebuild(&mut self) {
        self.projection.rebuild(self.tree.root());
    }

    async fn refresh_endpoints(&mut self) {
        if let Err(e) = self.endpoints.refresh(self.store.as_ref()).await {
            tracing::warn!(error = %e, "could not refresh endpoints");
        }
    }

    // ── Loading and navigation ────────────────────────────────────────

    /// List the root folder and fetch endpoint metadata.
    pub async fn load_root(&mut self) -> Result<()> {
        let options = self.list_options(false);
        self.tree
            .load_subtree(self.store.as_ref(), paths::ROOT, options)
            .await?;
        self.refresh_endpoints().await;
        self.rebuild();
        tracing::info!("loaded root folder");
        Ok(())
    }

    /// Reload `folder` recursively, or its nearest ancestor in the tree.
    pub async fn reload_folder(&mut self, folder: &str) -> Result<()> {
        let mut target = if paths::is_folder(folder) {
            folder.to_string()
        } else {
            paths::parent_of(folder)
        };
        while target != paths::ROOT && self.tree.find_node(&target).is_none() {
            target = paths::parent_of(&target);
        }
        let options = self.list_options(true);
        self.tree
            .load_subtree(self.store.as_ref(), &target, options)
            .await?;
        self.rebuild();
        tracing::info!(folder = %target, "reloaded folder");
        Ok(())
    }

    /// Reload everything from the root.
    pub async fn reload_all(&mut self) -> Result<()> {
        self.reload_folder(paths::ROOT).await?;
        self.refresh_endpoints().await;
        Ok(())
    }

    /// Expand `folder`, listing it first if it has never been listed.
    pub async fn expand(&mut self, folder: &str) -> Result<()> {
        let node = self
            .tree
            .find_node(folder)
            .ok_or_else(|| AppError::NotFound(folder.to_string()))?;
        if !node.is_folder {
            return Ok(());
        }
        if !node.is_listed() {
            let options = self.list_options(false);
            self.tree
                .load_subtree(self.store.as_ref(), folder, options)
                .await?;
            self.rebuild();
        }
        self.projection.expand(folder);
        self.active_folder = folder.to_string();
        Ok(())
    }

    pub fn collapse(&mut self, folder: &str) {
        self.projection.collapse(folder);
    }

    pub fn select_folder(&mut self, folder: &str) {
        if paths::is_folder(folder) {
            self.active_folder = folder.to_string();
        }
    }

    pub fn set_filter(&mut self, keyword: &str) {
        self.projection.set_filter(self.tree.root(), keyword);
    }

    // ── Documents ─────────────────────────────────────────────────────

    /// Open `path`, or activate it if already open.
    ///
    /// Files without an editor produce [`Prompt::UnsupportedFile`].
    pub async fn open(&mut self, path: &str) -> Result<Step> {
        match self.load_document(path).await {
            Ok(()) => Ok(Step::Done),
            Err(AppError::UnsupportedFileType { path }) => {
                let actions = FileTypes::fallback_actions(&path);
                Ok(Step::Prompt(Prompt::UnsupportedFile { path, actions }))
            }
            Err(e) => Err(e),
        }
    }

    async fn load_document(&mut self, path: &str) -> Result<()> {
        if self.documents.activate(path) {
            self.active_folder = paths::parent_of(path);
            return Ok(());
        }
        if !self.options.file_types.is_supported(path) {
            return Err(AppError::UnsupportedFileType {
                path: path.to_string(),
            });
        }
        let content = self.store.read_file(path).await?;
        self.documents.insert(OpenDocument::new(path, &content));
        self.active_folder = paths::parent_of(path);
        tracing::info!(path, "opened document");
        Ok(())
    }

    /// Close `path`. Unsaved changes without `force` produce
    /// [`Prompt::UnsavedChanges`] and leave the document open.
    pub fn close(&mut self, path: &str, force: bool) -> Result<Step> {
        match self.documents.close(path, force) {
            CloseOutcome::Closed => {
                tracing::debug!(path, "closed document");
                Ok(Step::Done)
            }
            CloseOutcome::NeedsDecision => Ok(Step::Prompt(Prompt::UnsavedChanges {
                path: path.to_string(),
            })),
            CloseOutcome::NotOpen => Err(AppError::NotFound(path.to_string())),
        }
    }

    pub fn activate_document(&mut self, path: &str) -> bool {
        let activated = self.documents.activate(path);
        if activated {
            self.active_folder = paths::parent_of(path);
        }
        activated
    }

    pub fn cycle_document(&mut self, offset: isize) {
        self.documents.cycle(offset);
        if let Some(path) = self.documents.active_path() {
            self.active_folder = paths::parent_of(path);
        }
    }

    /// Write the buffer of `path` to the store and mark it clean.
    pub async fn save(&mut self, path: &str) -> Result<()> {
        let content = self
            .documents
            .get(path)
            .map(|d| d.buffer.text())
            .ok_or_else(|| AppError::NotFound(path.to_string()))?;
        self.store.write_file(path, content.into_bytes()).await?;
        self.documents.mark_clean(path);
        tracing::info!(path, "saved document");
        Ok(())
    }

    /// Apply `f` to the active buffer and sync the dirty flag with its clean
    /// marker. Returns `false` when no document is active.
    pub fn edit<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut TextBuffer),
    {
        let Some(doc) = self.documents.active_mut() else {
            return false;
        };
        f(&mut doc.buffer);
        doc.dirty = !doc.buffer.is_clean();
        true
    }

    pub fn dirty_documents(&self) -> Vec<String> {
        self.documents.dirty_paths()
    }

    // ── Mutations ─────────────────────────────────────────────────────

    /// Create a file or folder named `name` in the active folder. New files
    /// are opened when `open` is set.
    pub async fn create(&mut self, name: &str, is_folder: bool, open: bool) -> Result<Step> {
        paths::validate_name(name)?;
        let folder = self.active_folder.clone();
        let path = paths::child_path(&folder, name, is_folder);
        let unlisted = self
            .tree
            .find_node(&folder)
            .is_some_and(|node| !node.is_listed());
        if unlisted {
            // Existing entries must be known before checking for a clash.
            let options = self.list_options(false);
            self.tree
                .load_subtree(self.store.as_ref(), &folder, options)
                .await?;
        }
        if self.tree.find_node(&path).is_some() {
            return Err(AppError::Validation(format!("{} already exists", path)));
        }

        if is_folder {
            self.store.create_folder(&path).await?;
        } else {
            self.store.write_file(&path, Vec::new()).await?;
        }

        let node = if is_folder {
            TreeNode::listed_folder(&path)
        } else {
            TreeNode::new(&path)
        };
        self.tree.insert_sorted(&folder, node)?;
        if folder != paths::ROOT {
            self.projection.expand(&folder);
        }
        self.rebuild();
        self.projection.select_path(&path);
        tracing::info!(path = %path, is_folder, "created");

        if is_folder {
            self.active_folder = path;
            Ok(Step::Done)
        } else if open {
            self.open(&path).await
        } else {
            Ok(Step::Done)
        }
    }

    /// Rename the file or folder at `path` to `new_name`, keeping its parent.
    pub async fn rename(&mut self, path: &str, new_name: &str) -> Result<()> {
        paths::validate_name(new_name)?;
        if paths::name_of(path) == new_name {
            return Err(AppError::Validation(format!(
                "{} already has that name",
                path
            )));
        }
        let is_folder = paths::is_folder(path);
        if is_folder && paths::is_protected(path) {
            return Err(AppError::ProtectedPath(path.to_string()));
        }
        if self.tree.find_node(path).is_none() {
            return Err(AppError::NotFound(path.to_string()));
        }
        let new_path = paths::renamed(path, new_name);
        if self.tree.find_node(&new_path).is_some() {
            return Err(AppError::Validation(format!("{} already exists", new_path)));
        }

        self.store.rename(path, &new_path).await?;
        tracing::info!(from = path, to = %new_path, "renamed");

        if !is_folder {
            self.tree.rename_node(path, &new_path)?;
            self.documents.rename(path, &new_path);
            self.refresh_endpoints().await;
            self.rebuild();
            self.projection.select_path(&new_path);
            return Ok(());
        }

        self.documents.rebase(path, &new_path);
        if let Some(folder) = paths::rebase(&self.active_folder, path, &new_path) {
            self.active_folder = folder;
        }
        self.projection.rebase_expanded(path, &new_path);
        self.tree.remove_node(path);
        self.tree
            .insert_sorted(&paths::parent_of(&new_path), TreeNode::new(&new_path))?;
        let options = self.list_options(true);
        let reload = self
            .tree
            .load_subtree(self.store.as_ref(), &new_path, options)
            .await;
        self.refresh_endpoints().await;
        self.rebuild();
        self.projection.select_path(&new_path);
        reload
    }

    /// Delete the file or folder at `path`.
    ///
    /// Protected folders are rejected before anything is sent. Without
    /// `confirmed`, asks first when deletes need confirmation or when open
    /// documents with unsaved changes would be lost.
    pub async fn delete(&mut self, path: &str, confirmed: bool) -> Result<Step> {
        let is_folder = paths::is_folder(path);
        if is_folder && paths::is_protected(path) {
            return Err(AppError::ProtectedPath(path.to_string()));
        }
        if self.tree.find_node(path).is_none() {
            return Err(AppError::NotFound(path.to_string()));
        }

        let unsaved = if is_folder {
            self.documents.dirty_under(path)
        } else {
            self.documents
                .get(path)
                .filter(|d| d.dirty)
                .map(|d| vec![d.path.clone()])
                .unwrap_or_default()
        };
        if !confirmed && (self.options.confirm_delete || !unsaved.is_empty()) {
            return Ok(Step::Prompt(Prompt::ConfirmDelete {
                path: path.to_string(),
                is_folder,
                unsaved,
            }));
        }

        if is_folder {
            self.store.delete_folder(path).await?;
        } else {
            self.store.delete_file(path).await?;
        }
        tracing::info!(path, "deleted");

        self.tree.remove_node(path);
        if is_folder {
            self.documents.close_all_under(path, true);
            self.active_folder = paths::parent_of(path);
        } else {
            self.documents.close(path, true);
        }
        self.rebuild();
        Ok(Step::Done)
    }

    /// Upload a local file into the active folder. Returns the remote path.
    pub async fn upload(&mut self, local: &Path) -> Result<String> {
        let name = local
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Validation(format!("{} has no file name", local.display())))?;
        paths::validate_name(name)?;
        let content = tokio::fs::read(local).await?;
        let folder = self.active_folder.clone();
        let path = paths::child_path(&folder, name, false);

        self.store.write_file(&path, content).await?;
        tracing::info!(path = %path, local = %local.display(), "uploaded");
        self.reload_folder(&folder).await?;
        Ok(path)
    }

    /// Extract a zip archive in place and reload its folder.
    pub async fn unzip(&mut self, path: &str) -> Result<()> {
        if !paths::extension(path).is_some_and(|e| e.eq_ignore_ascii_case("zip")) {
            return Err(AppError::Validation(format!("{} is not a zip archive", path)));
        }
        self.store.unzip(path).await?;
        tracing::info!(path, "unzipped");
        self.reload_folder(&paths::parent_of(path)).await
    }

    /// Save the file at `path` into the download directory.
    pub async fn download(&mut self, path: &str) -> Result<PathBuf> {
        if paths::is_folder(path) {
            return Err(AppError::Validation(format!("{} is a folder", path)));
        }
        let content = self.store.download(path).await?;
        tokio::fs::create_dir_all(&self.options.download_dir).await?;
        let target = self.options.download_dir.join(paths::name_of(path));
        tokio::fs::write(&target, content).await?;
        tracing::info!(path, target = %target.display(), "downloaded");
        Ok(target)
    }

    pub async fn list_macros(&self) -> Result<Vec<String>> {
        Ok(self.store.list_macros().await?)
    }

    /// Run macro `name` with `provided` arguments plus auto-filled context,
    /// then apply the refresh it asks for.
    pub async fn execute_macro(
        &mut self,
        name: &str,
        provided: BTreeMap<String, String>,
    ) -> Result<MacroOutcome> {
        let definition = self.store.get_macro(name).await?;
        let args = macros::fill_arguments(
            &definition,
            &self.active_folder,
            &self.options.default_role,
            provided,
        )?;
        let response = self.store.execute_macro(name, &args).await?;
        let outcome = MacroOutcome::parse(&response.result);
        tracing::info!(name, ?outcome, "executed macro");

        match &outcome {
            MacroOutcome::Success => {}
            MacroOutcome::RefreshFolder(folder) => self.reload_folder(folder).await?,
            MacroOutcome::RefreshAll => self.reload_all().await?,
        }
        Ok(outcome)
    }

    // ── Decisions ─────────────────────────────────────────────────────

    /// Continue the operation that produced `prompt` with the user's answer.
    pub async fn resume(&mut self, prompt: Prompt, decision: Decision) -> Result<Step> {
        if !prompt.accepts(decision) {
            return Err(AppError::Validation(format!(
                "{:?} does not answer {}",
                decision,
                prompt.title()
            )));
        }
        match (prompt, decision) {
            (_, Decision::Cancel) => Ok(Step::Done),
            (Prompt::ConfirmDelete { path, .. }, Decision::Confirm) => {
                self.delete(&path, true).await
            }
            (Prompt::UnsavedChanges { path }, Decision::Save) => {
                self.save(&path).await?;
                self.close(&path, false)
            }
            (Prompt::UnsavedChanges { path }, Decision::Discard) => self.close(&path, true),
            (Prompt::UnsupportedFile { path, .. }, Decision::Fallback(action)) => match action {
                FallbackAction::Download => {
                    self.download(&path).await?;
                    Ok(Step::Done)
                }
                FallbackAction::Delete => self.delete(&path, false).await,
                FallbackAction::Unzip => {
                    self.unzip(&path).await?;
                    Ok(Step::Done)
                }
            },
            (prompt, decision) => Err(AppError::Validation(format!(
                "{:?} does not answer {}",
                decision,
                prompt.title()
            ))),
        }
    }
}
