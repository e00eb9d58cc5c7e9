use std::cmp::Ordering;

use crate::error::{AppError, Result};
use crate::ide::paths;
use crate::store::{FileStore, ListOptions};

/// A file or folder in the mirrored remote namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub is_folder: bool,
    pub level: usize,
    pub is_system: bool,
    /// `None` until the folder has been listed. Always `None` for files.
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    /// Create an unlisted node for `path`.
    pub fn new(path: &str) -> Self {
        let name = if path == paths::ROOT {
            paths::ROOT.to_string()
        } else {
            paths::name_of(path).to_string()
        };
        Self {
            name,
            path: path.to_string(),
            is_folder: paths::is_folder(path),
            level: paths::level_of(path),
            is_system: paths::is_system(path),
            children: None,
        }
    }

    /// Create a folder node whose (empty) listing is already known.
    pub fn listed_folder(path: &str) -> Self {
        let mut node = Self::new(path);
        node.children = Some(Vec::new());
        node
    }

    pub fn is_listed(&self) -> bool {
        self.children.is_some()
    }

    /// Folders first, then case-insensitive by path.
    fn order(a: &TreeNode, b: &TreeNode) -> Ordering {
        b.is_folder
            .cmp(&a.is_folder)
            .then_with(|| a.path.to_lowercase().cmp(&b.path.to_lowercase()))
    }

    fn find(&self, target: &str) -> Option<&TreeNode> {
        if self.path == target {
            return Some(self);
        }
        if !self.is_folder || !target.starts_with(&self.path) {
            return None;
        }
        self.children
            .as_ref()?
            .iter()
            .find_map(|child| child.find(target))
    }

    fn find_mut(&mut self, target: &str) -> Option<&mut TreeNode> {
        if self.path == target {
            return Some(self);
        }
        if !self.is_folder || !target.starts_with(&self.path) {
            return None;
        }
        self.children
            .as_mut()?
            .iter_mut()
            .find_map(|child| child.find_mut(target))
    }

    /// Insert `node` among this folder's children, replacing a node with the
    /// same path. Returns `false` when this folder is not listed yet.
    fn insert_child(&mut self, node: TreeNode) -> bool {
        let Some(children) = self.children.as_mut() else {
            return false;
        };
        if let Some(existing) = children.iter().position(|c| c.path == node.path) {
            children.remove(existing);
        }
        let idx = children
            .binary_search_by(|c| TreeNode::order(c, &node))
            .unwrap_or_else(|i| i);
        children.insert(idx, node);
        true
    }
}

/// Authoritative in-memory mirror of the remote namespace, populated lazily.
#[derive(Debug, Clone)]
pub struct TreeStore {
    root: TreeNode,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore {
    /// An empty tree with an unlisted root.
    pub fn new() -> Self {
        Self {
            root: TreeNode::new(paths::ROOT),
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Depth-first search from the root.
    pub fn find_node(&self, path: &str) -> Option<&TreeNode> {
        self.root.find(path)
    }

    pub fn find_node_mut(&mut self, path: &str) -> Option<&mut TreeNode> {
        self.root.find_mut(path)
    }

    /// Detach the node at `path` from its parent. The root is never removed.
    pub fn remove_node(&mut self, path: &str) -> bool {
        if path == paths::ROOT {
            return false;
        }
        let parent = paths::parent_of(path);
        let Some(children) = self
            .root
            .find_mut(&parent)
            .and_then(|p| p.children.as_mut())
        else {
            return false;
        };
        match children.iter().position(|c| c.path == path) {
            Some(idx) => {
                children.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Insert `node` under `parent_path`, folders first then by path.
    ///
    /// Fails when the parent is not in the tree. Returns `Ok(false)` when the
    /// parent exists but has not been listed yet; the node will show up when
    /// it is.
    pub fn insert_sorted(&mut self, parent_path: &str, node: TreeNode) -> Result<bool> {
        let parent = self
            .root
            .find_mut(parent_path)
            .filter(|p| p.is_folder)
            .ok_or_else(|| AppError::ParentNotFound(node.path.clone()))?;
        if !node.path.starts_with(&parent.path) || node.path == parent.path {
            return Err(AppError::ParentNotFound(node.path));
        }
        Ok(parent.insert_child(node))
    }

    /// Move a file node to `new_path`, keeping its parent's order.
    pub fn rename_node(&mut self, old_path: &str, new_path: &str) -> Result<()> {
        let mut node = self
            .find_node(old_path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(old_path.to_string()))?;
        self.remove_node(old_path);
        node.path = new_path.to_string();
        node.name = paths::name_of(new_path).to_string();
        self.insert_sorted(&paths::parent_of(new_path), node)?;
        Ok(())
    }

    /// Fetch folders and files beneath `folder` and replace its children.
    ///
    /// The listing is assembled off to the side; the live tree only changes
    /// when both calls succeed and every path finds its parent.
    pub async fn load_subtree(
        &mut self,
        store: &dyn FileStore,
        folder: &str,
        options: ListOptions,
    ) -> Result<()> {
        if self.find_node(folder).filter(|n| n.is_folder).is_none() {
            return Err(AppError::ParentNotFound(folder.to_string()));
        }
        let (folders, files) = tokio::try_join!(
            store.list_folders(folder, options),
            store.list_files(folder, options)
        )?;
        tracing::debug!(
            folder,
            folders = folders.len(),
            files = files.len(),
            "listed subtree"
        );
        self.apply_listing(folder, folders, files, options.recursive)
    }

    /// Replace the children of `folder` with the given listing.
    ///
    /// With `recursive`, child folders are marked as listed; otherwise they
    /// stay unlisted and load on expansion.
    pub fn apply_listing(
        &mut self,
        folder: &str,
        mut folders: Vec<String>,
        files: Vec<String>,
        recursive: bool,
    ) -> Result<()> {
        let mut staging = TreeNode::listed_folder(folder);

        // Parents before children.
        folders.sort_by(|a, b| {
            paths::level_of(a)
                .cmp(&paths::level_of(b))
                .then_with(|| a.cmp(b))
        });
        for path in folders.iter().filter(|p| p.as_str() != folder) {
            let mut node = TreeNode::new(path);
            if recursive {
                node.children = Some(Vec::new());
            }
            stage(&mut staging, node)?;
        }
        for path in files {
            stage(&mut staging, TreeNode::new(&path))?;
        }

        let target = self
            .root
            .find_mut(folder)
            .ok_or_else(|| AppError::ParentNotFound(folder.to_string()))?;
        target.children = staging.children;
        Ok(())
    }
}

/// Place `node` in the staging subtree under its parent folder.
fn stage(staging: &mut TreeNode, node: TreeNode) -> Result<()> {
    let parent_path = paths::parent_of(&node.path);
    let parent = staging
        .find_mut(&parent_path)
        .filter(|p| p.is_folder)
        .ok_or_else(|| AppError::ParentNotFound(node.path.clone()))?;
    if parent.children.is_none() {
        // Non-recursive listings only ever contain direct children.
        return Err(AppError::ParentNotFound(node.path));
    }
    parent.insert_child(node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    const RECURSIVE: ListOptions = ListOptions {
        recursive: true,
        include_system: true,
    };

    fn sample_store() -> MemoryStore {
        MemoryStore::with_paths(&[
            "/modules/foo/get.hl",
            "/modules/foo/Post.hl",
            "/modules/foo/sub/",
            "/modules/bar/",
            "/system/auth/login.post.hl",
            "/readme.md",
        ])
    }

    fn names(node: &TreeNode) -> Vec<&str> {
        node.children
            .as_ref()
            .map(|c| c.iter().map(|n| n.name.as_str()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn loaded_paths_are_findable_with_ancestors() {
        let store = sample_store();
        let mut tree = TreeStore::new();
        tree.load_subtree(&store, "/", RECURSIVE).await.unwrap();

        for path in [
            "/modules/",
            "/modules/foo/",
            "/modules/foo/get.hl",
            "/modules/foo/sub/",
            "/system/auth/login.post.hl",
            "/readme.md",
        ] {
            let node = tree.find_node(path).expect(path);
            assert_eq!(node.path, path);
            let mut ancestor = paths::parent_of(path);
            loop {
                assert!(tree.find_node(&ancestor).is_some(), "{}", ancestor);
                if ancestor == "/" {
                    break;
                }
                ancestor = paths::parent_of(&ancestor);
            }
        }
    }

    #[tokio::test]
    async fn levels_and_system_flags() {
        let store = sample_store();
        let mut tree = TreeStore::new();
        tree.load_subtree(&store, "/", RECURSIVE).await.unwrap();

        assert_eq!(tree.root().level, 0);
        let foo = tree.find_node("/modules/foo/").unwrap();
        assert_eq!(foo.level, 2);
        for child in foo.children.as_ref().unwrap() {
            assert_eq!(child.level, foo.level + 1);
            assert!(child.path.starts_with(&foo.path));
        }
        assert!(tree.find_node("/system/auth/").unwrap().is_system);
        assert!(!foo.is_system);
    }

    #[tokio::test]
    async fn folders_sort_before_files_case_insensitively() {
        let store = sample_store();
        let mut tree = TreeStore::new();
        tree.load_subtree(&store, "/", RECURSIVE).await.unwrap();

        assert_eq!(names(tree.root()), vec!["modules", "system", "readme.md"]);
        assert_eq!(
            names(tree.find_node("/modules/foo/").unwrap()),
            vec!["sub", "get.hl", "Post.hl"]
        );
    }

    #[tokio::test]
    async fn non_recursive_load_leaves_folders_unlisted() {
        let store = sample_store();
        let mut tree = TreeStore::new();
        let lazy = ListOptions {
            recursive: false,
            include_system: false,
        };
        tree.load_subtree(&store, "/", lazy).await.unwrap();

        assert_eq!(names(tree.root()), vec!["modules", "readme.md"]);
        assert!(!tree.find_node("/modules/").unwrap().is_listed());

        tree.load_subtree(&store, "/modules/", lazy).await.unwrap();
        assert_eq!(names(tree.find_node("/modules/").unwrap()), vec!["bar", "foo"]);
    }

    #[tokio::test]
    async fn failed_listing_leaves_tree_untouched() {
        let store = sample_store();
        let mut tree = TreeStore::new();
        tree.load_subtree(&store, "/", RECURSIVE).await.unwrap();
        let before = tree.root().clone();

        store.fail_on("list_files");
        let result = tree.load_subtree(&store, "/modules/", RECURSIVE).await;
        assert!(matches!(result, Err(AppError::Remote(_))));
        assert_eq!(tree.root(), &before);
    }

    #[test]
    fn orphan_path_fails_without_partial_state() {
        let mut tree = TreeStore::new();
        tree.apply_listing("/", vec!["/a/".into()], vec!["/a/x.hl".into()], true)
            .unwrap();
        let before = tree.root().clone();

        let result = tree.apply_listing(
            "/",
            vec!["/b/".into()],
            vec!["/missing/y.hl".into()],
            true,
        );
        assert!(matches!(result, Err(AppError::ParentNotFound(p)) if p == "/missing/y.hl"));
        assert_eq!(tree.root(), &before);
    }

    #[test]
    fn folder_is_not_its_own_child() {
        let mut tree = TreeStore::new();
        tree.apply_listing("/", vec!["/".into(), "/a/".into()], vec![], true)
            .unwrap();
        assert_eq!(names(tree.root()), vec!["a"]);
    }

    #[test]
    fn remove_node_detaches_subtree() {
        let mut tree = TreeStore::new();
        tree.apply_listing(
            "/",
            vec!["/a/".into(), "/a/b/".into()],
            vec!["/a/b/c.hl".into()],
            true,
        )
        .unwrap();
        assert!(tree.remove_node("/a/b/"));
        assert!(tree.find_node("/a/b/c.hl").is_none());
        assert!(!tree.remove_node("/a/b/"));
        assert!(!tree.remove_node("/"));
    }

    #[test]
    fn insert_sorted_requires_parent() {
        let mut tree = TreeStore::new();
        tree.apply_listing("/", vec!["/a/".into()], vec!["/a/m.hl".into()], true)
            .unwrap();

        assert!(tree.insert_sorted("/a/", TreeNode::new("/a/b.hl")).unwrap());
        assert!(tree
            .insert_sorted("/a/", TreeNode::listed_folder("/a/z/"))
            .unwrap());
        assert_eq!(names(tree.find_node("/a/").unwrap()), vec!["z", "b.hl", "m.hl"]);

        let err = tree.insert_sorted("/nope/", TreeNode::new("/nope/x.hl"));
        assert!(matches!(err, Err(AppError::ParentNotFound(_))));
    }

    #[test]
    fn insert_into_unlisted_folder_is_deferred() {
        let mut tree = TreeStore::new();
        tree.apply_listing("/", vec!["/a/".into()], vec![], false)
            .unwrap();
        assert!(!tree.insert_sorted("/a/", TreeNode::new("/a/x.hl")).unwrap());
        assert!(tree.find_node("/a/x.hl").is_none());
    }

    #[test]
    fn rename_node_resorts() {
        let mut tree = TreeStore::new();
        tree.apply_listing(
            "/",
            vec![],
            vec!["/a.hl".into(), "/m.hl".into()],
            true,
        )
        .unwrap();
        tree.rename_node("/a.hl", "/z.hl").unwrap();
        assert_eq!(names(tree.root()), vec!["m.hl", "z.hl"]);
        assert_eq!(tree.find_node("/z.hl").unwrap().name, "z.hl");
        assert!(tree.find_node("/a.hl").is_none());
    }
}
