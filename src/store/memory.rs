//! In-memory [`FileStore`] used by tests. Records every call.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{EndpointMeta, FileStore, ListOptions, MacroDefinition, MacroResponse};
use crate::error::{RemoteError, StoreResult};
use crate::ide::paths;

#[derive(Debug, Default)]
struct State {
    folders: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    endpoints: Vec<EndpointMeta>,
    macros: BTreeMap<String, MacroDefinition>,
    macro_result: String,
    failing: HashSet<&'static str>,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Build a store from a list of paths; folders end with `/`.
    /// Ancestor folders are created implicitly.
    pub fn with_paths(entries: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut state = store.lock();
            state.folders.insert("/".into());
            state.macro_result = "success".into();
            for entry in entries {
                let mut parent = paths::parent_of(entry);
                while parent != "/" {
                    state.folders.insert(parent.clone());
                    parent = paths::parent_of(&parent);
                }
                if paths::is_folder(entry) {
                    state.folders.insert(entry.to_string());
                } else {
                    state
                        .files
                        .insert(entry.to_string(), format!("// {}\n", entry).into_bytes());
                }
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make every subsequent call of `op` fail with HTTP 500.
    pub fn fail_on(&self, op: &'static str) {
        self.lock().failing.insert(op);
    }

    pub fn set_macro(&self, definition: MacroDefinition, result: &str) {
        let mut state = self.lock();
        state.macro_result = result.to_string();
        state.macros.insert(definition.name.clone(), definition);
    }

    pub fn set_endpoints(&self, endpoints: Vec<EndpointMeta>) {
        self.lock().endpoints = endpoints;
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.lock().files.contains_key(path)
    }

    pub fn has_folder(&self, path: &str) -> bool {
        self.lock().folders.contains(path)
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.lock()
            .files
            .get(path)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Record the call and fail it if requested.
    fn enter(&self, op: &'static str, detail: String) -> StoreResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(format!("{} {}", op, detail).trim_end().to_string());
        if state.failing.contains(op) {
            return Err(RemoteError::Status {
                status: 500,
                message: format!("{} failed", op),
            });
        }
        Ok(state)
    }
}

fn listed(path: &str, folder: &str, options: ListOptions) -> bool {
    if path == folder || !path.starts_with(folder) {
        return false;
    }
    if !options.include_system && paths::is_system(path) {
        return false;
    }
    options.recursive || paths::parent_of(path) == folder
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn list_folders(&self, folder: &str, options: ListOptions) -> StoreResult<Vec<String>> {
        let state = self.enter("list_folders", folder.to_string())?;
        Ok(state
            .folders
            .iter()
            .filter(|p| listed(p, folder, options))
            .cloned()
            .collect())
    }

    async fn list_files(&self, folder: &str, options: ListOptions) -> StoreResult<Vec<String>> {
        let state = self.enter("list_files", folder.to_string())?;
        Ok(state
            .files
            .keys()
            .filter(|p| listed(p, folder, options))
            .cloned()
            .collect())
    }

    async fn read_file(&self, path: &str) -> StoreResult<String> {
        let state = self.enter("read_file", path.to_string())?;
        state
            .files
            .get(path)
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn download(&self, path: &str) -> StoreResult<Vec<u8>> {
        let state = self.enter("download", path.to_string())?;
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, content: Vec<u8>) -> StoreResult<()> {
        let mut state = self.enter("write_file", path.to_string())?;
        state.files.insert(path.to_string(), content);
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> StoreResult<()> {
        let mut state = self.enter("create_folder", path.to_string())?;
        if !state.folders.insert(path.to_string()) {
            return Err(RemoteError::Conflict(format!("{} exists", path)));
        }
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> StoreResult<()> {
        let mut state = self.enter("delete_file", path.to_string())?;
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }

    async fn delete_folder(&self, path: &str) -> StoreResult<()> {
        let mut state = self.enter("delete_folder", path.to_string())?;
        if !state.folders.contains(path) {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        state.folders.retain(|p| !p.starts_with(path));
        state.files.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> StoreResult<()> {
        let mut state = self.enter("rename", format!("{} {}", old_path, new_path))?;
        if paths::is_folder(old_path) {
            if !state.folders.contains(old_path) {
                return Err(RemoteError::NotFound(old_path.to_string()));
            }
            let folders: BTreeSet<String> = state
                .folders
                .iter()
                .map(|p| paths::rebase(p, old_path, new_path).unwrap_or_else(|| p.clone()))
                .collect();
            let files: BTreeMap<String, Vec<u8>> = std::mem::take(&mut state.files)
                .into_iter()
                .map(|(p, c)| {
                    (
                        paths::rebase(&p, old_path, new_path).unwrap_or(p),
                        c,
                    )
                })
                .collect();
            state.folders = folders;
            state.files = files;
        } else {
            let content = state
                .files
                .remove(old_path)
                .ok_or_else(|| RemoteError::NotFound(old_path.to_string()))?;
            state.files.insert(new_path.to_string(), content);
        }
        Ok(())
    }

    async fn unzip(&self, path: &str) -> StoreResult<()> {
        let mut state = self.enter("unzip", path.to_string())?;
        let folder = format!(
            "{}{}/",
            paths::parent_of(path),
            paths::name_of(path).trim_end_matches(".zip")
        );
        state.files.insert(format!("{}extracted.hl", folder), Vec::new());
        state.folders.insert(folder);
        Ok(())
    }

    async fn list_endpoints(&self) -> StoreResult<Vec<EndpointMeta>> {
        let state = self.enter("list_endpoints", String::new())?;
        Ok(state.endpoints.clone())
    }

    async fn list_macros(&self) -> StoreResult<Vec<String>> {
        let state = self.enter("list_macros", String::new())?;
        Ok(state.macros.keys().cloned().collect())
    }

    async fn get_macro(&self, name: &str) -> StoreResult<MacroDefinition> {
        let state = self.enter("get_macro", name.to_string())?;
        state
            .macros
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(name.to_string()))
    }

    async fn execute_macro(
        &self,
        name: &str,
        args: &BTreeMap<String, String>,
    ) -> StoreResult<MacroResponse> {
        let detail = args
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        let state = self.enter("execute_macro", format!("{} {}", name, detail))?;
        Ok(MacroResponse {
            result: state.macro_result.clone(),
        })
    }
}
