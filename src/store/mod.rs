//! The remote file store the IDE mirrors.

pub mod http;
#[cfg(test)]
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Listing options for folder and file enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// List the whole subtree instead of immediate children.
    pub recursive: bool,
    /// Include backend-owned folders such as `/system/`.
    pub include_system: bool,
}

/// An HTTP endpoint known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointMeta {
    pub path: String,
    pub verb: String,
}

/// One declared argument of a server-side macro.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MacroArgument {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub mandatory: bool,
}

/// Definition of a server-side macro.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub arguments: Vec<MacroArgument>,
}

/// Raw macro execution response: `success`, `folders-changed` or
/// `folders-changed|<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MacroResponse {
    pub result: String,
}

/// Hierarchical file storage with macro execution.
///
/// Every call either succeeds or fails with a [`crate::error::RemoteError`];
/// callers update local state only after success.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug + 'static {
    /// Folder paths beneath `folder`, each ending with `/`.
    async fn list_folders(&self, folder: &str, options: ListOptions) -> StoreResult<Vec<String>>;

    /// File paths beneath `folder`.
    async fn list_files(&self, folder: &str, options: ListOptions) -> StoreResult<Vec<String>>;

    /// Text content of a file.
    async fn read_file(&self, path: &str) -> StoreResult<String>;

    /// Raw bytes of a file.
    async fn download(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Create or overwrite a file.
    async fn write_file(&self, path: &str, content: Vec<u8>) -> StoreResult<()>;

    async fn create_folder(&self, path: &str) -> StoreResult<()>;

    async fn delete_file(&self, path: &str) -> StoreResult<()>;

    /// Delete a folder and everything beneath it.
    async fn delete_folder(&self, path: &str) -> StoreResult<()>;

    /// Rename or move a file or folder.
    async fn rename(&self, old_path: &str, new_path: &str) -> StoreResult<()>;

    /// Extract a zip archive into the folder containing it.
    async fn unzip(&self, path: &str) -> StoreResult<()>;

    async fn list_endpoints(&self) -> StoreResult<Vec<EndpointMeta>>;

    async fn list_macros(&self) -> StoreResult<Vec<String>>;

    async fn get_macro(&self, name: &str) -> StoreResult<MacroDefinition>;

    async fn execute_macro(
        &self,
        name: &str,
        args: &BTreeMap<String, String>,
    ) -> StoreResult<MacroResponse>;
}
