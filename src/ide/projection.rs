//! Flat, indented projection of the tree for the tree panel.
//!
//! The projection is rebuilt from scratch after every tree mutation;
//! expanded folders are carried over by path.

use std::collections::{BTreeSet, HashSet};

use crate::ide::paths;
use crate::ide::tree::TreeNode;

/// One row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNode {
    pub path: String,
    pub name: String,
    pub level: usize,
    pub expandable: bool,
}

impl FlatNode {
    fn from_node(node: &TreeNode) -> Self {
        Self {
            path: node.path.clone(),
            name: node.name.clone(),
            level: node.level,
            expandable: node.is_folder,
        }
    }
}

/// Pre-order iterator over every node below the root.
pub struct Flatten<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = FlatNode;

    fn next(&mut self) -> Option<FlatNode> {
        let node = self.stack.pop()?;
        if let Some(children) = &node.children {
            self.stack.extend(children.iter().rev());
        }
        Some(FlatNode::from_node(node))
    }
}

/// Flatten the tree below `root`, in display order.
pub fn flatten(root: &TreeNode) -> Flatten<'_> {
    let stack = root
        .children
        .as_ref()
        .map(|c| c.iter().rev().collect())
        .unwrap_or_default();
    Flatten { stack }
}

/// Expanded folders that still exist in `nodes`.
pub fn reconcile_expansion(previous: &BTreeSet<String>, nodes: &[FlatNode]) -> BTreeSet<String> {
    nodes
        .iter()
        .filter(|n| n.expandable && previous.contains(&n.path))
        .map(|n| n.path.clone())
        .collect()
}

/// Paths left visible by a case-insensitive keyword filter.
///
/// A file is visible when its path contains the keyword; a folder when its
/// own path or any descendant's path does.
pub fn filter_matches(root: &TreeNode, keyword: &str) -> HashSet<String> {
    let keyword = keyword.to_lowercase();
    let mut visible = HashSet::new();
    if let Some(children) = &root.children {
        for child in children {
            mark_matches(child, &keyword, &mut visible);
        }
    }
    visible
}

fn mark_matches(node: &TreeNode, keyword: &str, visible: &mut HashSet<String>) -> bool {
    let mut matched = node.path.to_lowercase().contains(keyword);
    if let Some(children) = &node.children {
        for child in children {
            if mark_matches(child, keyword, visible) {
                matched = true;
            }
        }
    }
    if matched {
        visible.insert(node.path.clone());
    }
    matched
}

/// Tree panel state: flat rows, expansion, filter, selection and scroll.
#[derive(Debug, Default)]
pub struct Projection {
    nodes: Vec<FlatNode>,
    expanded: BTreeSet<String>,
    filter: String,
    matches: HashSet<String>,
    /// Indices into `nodes` currently shown.
    visible: Vec<usize>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl Projection {
    /// Re-derive rows from `root`, keeping expansion and selection by path.
    pub fn rebuild(&mut self, root: &TreeNode) {
        let selected_path = self.selected_node().map(|n| n.path.clone());
        self.nodes = flatten(root).collect();
        self.expanded = reconcile_expansion(&self.expanded, &self.nodes);
        if !self.filter.is_empty() {
            self.matches = filter_matches(root, &self.filter);
        }
        self.recompute_visible();
        if let Some(path) = selected_path {
            self.select_path(&path);
        }
        self.clamp_selection();
    }

    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    pub fn expanded(&self) -> &BTreeSet<String> {
        &self.expanded
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        !self.filter.is_empty() || self.expanded.contains(path)
    }

    /// Mark `folder` expanded. Its rows appear once it has been listed.
    pub fn expand(&mut self, folder: &str) {
        if paths::is_folder(folder) {
            self.expanded.insert(folder.to_string());
            self.recompute_visible();
        }
    }

    pub fn collapse(&mut self, folder: &str) {
        self.expanded.remove(folder);
        self.recompute_visible();
        self.clamp_selection();
    }

    /// Move expansion state from one folder prefix to another.
    pub fn rebase_expanded(&mut self, old_prefix: &str, new_prefix: &str) {
        self.expanded = self
            .expanded
            .iter()
            .map(|p| paths::rebase(p, old_prefix, new_prefix).unwrap_or_else(|| p.clone()))
            .collect();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, root: &TreeNode, keyword: &str) {
        self.filter = keyword.trim().to_string();
        self.matches = if self.filter.is_empty() {
            HashSet::new()
        } else {
            filter_matches(root, &self.filter)
        };
        self.recompute_visible();
        self.clamp_selection();
    }

    fn recompute_visible(&mut self) {
        self.visible.clear();
        let filtering = !self.filter.is_empty();
        // Level of the closest collapsed ancestor, if any.
        let mut collapsed_at: Option<usize> = None;
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(level) = collapsed_at {
                if node.level > level {
                    continue;
                }
                collapsed_at = None;
            }
            if filtering && !self.matches.contains(&node.path) {
                continue;
            }
            self.visible.push(idx);
            if node.expandable && !filtering && !self.expanded.contains(&node.path) {
                collapsed_at = Some(node.level);
            }
        }
    }

    /// Rows currently shown, in order.
    pub fn visible(&self) -> impl Iterator<Item = &FlatNode> {
        self.visible.iter().map(|&idx| &self.nodes[idx])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn selected_node(&self) -> Option<&FlatNode> {
        self.visible
            .get(self.selected)
            .map(|&idx| &self.nodes[idx])
    }

    /// Select the visible row for `path`. Returns whether it was found.
    pub fn select_path(&mut self, path: &str) -> bool {
        match self
            .visible
            .iter()
            .position(|&idx| self.nodes[idx].path == path)
        {
            Some(pos) => {
                self.selected = pos;
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
    }

    /// Update the scroll offset to keep the selected row visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ide::tree::TreeStore;

    fn sample_tree() -> TreeStore {
        let mut tree = TreeStore::new();
        tree.apply_listing(
            "/",
            vec![
                "/modules/".into(),
                "/modules/foo/".into(),
                "/modules/bar/".into(),
                "/etc/".into(),
            ],
            vec![
                "/modules/foo/get.hl".into(),
                "/modules/bar/list.get.hl".into(),
                "/readme.md".into(),
            ],
            true,
        )
        .unwrap();
        tree
    }

    fn visible_paths(p: &Projection) -> Vec<&str> {
        p.visible().map(|n| n.path.as_str()).collect()
    }

    #[test]
    fn flatten_is_preorder_and_deterministic() {
        let tree = sample_tree();
        let first: Vec<FlatNode> = flatten(tree.root()).collect();
        let second: Vec<FlatNode> = flatten(tree.root()).collect();
        assert_eq!(first, second);
        let paths: Vec<&str> = first.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/etc/",
                "/modules/",
                "/modules/bar/",
                "/modules/bar/list.get.hl",
                "/modules/foo/",
                "/modules/foo/get.hl",
                "/readme.md",
            ]
        );
        assert_eq!(first[1].level, 1);
        assert_eq!(first[2].level, 2);
        assert!(first[1].expandable);
        assert!(!first[6].expandable);
    }

    #[test]
    fn flatten_of_unlisted_root_is_empty() {
        let tree = TreeStore::new();
        assert_eq!(flatten(tree.root()).count(), 0);
    }

    #[test]
    fn reconcile_is_idempotent_and_drops_vanished_paths() {
        let tree = sample_tree();
        let nodes: Vec<FlatNode> = flatten(tree.root()).collect();
        let previous: BTreeSet<String> = ["/modules/", "/gone/", "/readme.md"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let once = reconcile_expansion(&previous, &nodes);
        let twice = reconcile_expansion(&once, &nodes);
        assert_eq!(once, twice);
        assert_eq!(once.into_iter().collect::<Vec<_>>(), vec!["/modules/"]);
    }

    #[test]
    fn collapsed_folders_hide_descendants() {
        let tree = sample_tree();
        let mut p = Projection::default();
        p.rebuild(tree.root());
        assert_eq!(visible_paths(&p), vec!["/etc/", "/modules/", "/readme.md"]);

        p.expand("/modules/");
        assert_eq!(
            visible_paths(&p),
            vec!["/etc/", "/modules/", "/modules/bar/", "/modules/foo/", "/readme.md"]
        );

        p.expand("/modules/foo/");
        p.collapse("/modules/");
        assert_eq!(visible_paths(&p), vec!["/etc/", "/modules/", "/readme.md"]);
    }

    #[test]
    fn rebuild_preserves_expansion_and_selection() {
        let mut tree = sample_tree();
        let mut p = Projection::default();
        p.rebuild(tree.root());
        p.expand("/modules/");
        p.expand("/modules/foo/");
        assert!(p.select_path("/modules/foo/get.hl"));

        tree.insert_sorted("/modules/foo/", TreeNode::new("/modules/foo/a.hl"))
            .unwrap();
        p.rebuild(tree.root());

        assert!(p.is_expanded("/modules/foo/"));
        assert_eq!(p.selected_node().unwrap().path, "/modules/foo/get.hl");
        assert!(visible_paths(&p).contains(&"/modules/foo/a.hl"));
    }

    #[test]
    fn filter_keeps_matching_files_and_their_folders() {
        let tree = sample_tree();
        let mut p = Projection::default();
        p.rebuild(tree.root());
        p.set_filter(tree.root(), "LIST");
        assert_eq!(
            visible_paths(&p),
            vec!["/modules/", "/modules/bar/", "/modules/bar/list.get.hl"]
        );

        p.set_filter(tree.root(), "foo");
        assert_eq!(
            visible_paths(&p),
            vec!["/modules/", "/modules/foo/", "/modules/foo/get.hl"]
        );

        p.set_filter(tree.root(), "");
        assert_eq!(visible_paths(&p), vec!["/etc/", "/modules/", "/readme.md"]);
    }

    #[test]
    fn folder_matching_by_own_path_stays_visible() {
        let tree = sample_tree();
        let matches = filter_matches(tree.root(), "etc");
        assert!(matches.contains("/etc/"));
        assert!(!matches.contains("/modules/"));
    }

    #[test]
    fn selection_is_clamped() {
        let tree = sample_tree();
        let mut p = Projection::default();
        p.rebuild(tree.root());
        p.select_last();
        p.select_next();
        assert_eq!(p.selected, 2);
        p.select_first();
        p.select_previous();
        assert_eq!(p.selected, 0);

        p.expand("/modules/");
        p.select_path("/modules/foo/");
        p.collapse("/modules/");
        assert!(p.selected < p.visible_len());
    }

    #[test]
    fn rebase_moves_expanded_paths() {
        let mut p = Projection::default();
        p.expand("/a/b/");
        p.expand("/a/b/c/");
        p.expand("/x/");
        p.rebase_expanded("/a/b/", "/a/z/");
        let expanded: Vec<&str> = p.expanded().iter().map(|s| s.as_str()).collect();
        assert_eq!(expanded, vec!["/a/z/", "/a/z/c/", "/x/"]);
    }

    #[test]
    fn scroll_follows_selection() {
        let mut p = Projection::default();
        p.selected = 10;
        p.update_scroll(5);
        assert_eq!(p.scroll_offset, 6);
        p.selected = 2;
        p.update_scroll(5);
        assert_eq!(p.scroll_offset, 2);
    }
}
