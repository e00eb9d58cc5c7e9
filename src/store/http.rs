//! [`FileStore`] backed by the Magic REST API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{EndpointMeta, FileStore, ListOptions, MacroDefinition, MacroResponse};
use crate::error::{RemoteError, StoreResult};
use crate::ide::paths;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for a single Magic backend.
#[derive(Debug, Clone)]
pub struct HttpFileStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct MacroSummary {
    name: String,
}

impl HttpFileStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Absolute URL of a system endpoint, e.g. `file-system/rename`.
    fn url(&self, endpoint: &str) -> String {
        format!("{}/magic/system/{}", self.base_url, endpoint)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let req = self.client.request(method, self.url(endpoint));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(req: RequestBuilder) -> StoreResult<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::from_status(
            status.as_u16(),
            message_from_body(&body, status.canonical_reason().unwrap_or("error")),
        ))
    }

    async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> StoreResult<T> {
        Self::send(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn send_empty(req: RequestBuilder) -> StoreResult<()> {
        Self::send(req).await.map(|_| ())
    }

    fn listing(&self, kind: &str, folder: &str, options: ListOptions) -> RequestBuilder {
        self.request(Method::GET, &listing_endpoint(kind, options.recursive))
            .query(&[
                ("folder", folder),
                ("sys", if options.include_system { "true" } else { "false" }),
            ])
    }
}

/// `file-system/list-folders` or `file-system/list-folders-recursively`.
fn listing_endpoint(kind: &str, recursive: bool) -> String {
    if recursive {
        format!("file-system/list-{}-recursively", kind)
    } else {
        format!("file-system/list-{}", kind)
    }
}

/// The backend reports errors as `{"message": "..."}`; fall back to the raw
/// body, then to the status reason.
fn message_from_body(body: &str, reason: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl FileStore for HttpFileStore {
    async fn list_folders(&self, folder: &str, options: ListOptions) -> StoreResult<Vec<String>> {
        tracing::debug!(folder, recursive = options.recursive, "listing folders");
        Self::send_json(self.listing("folders", folder, options)).await
    }

    async fn list_files(&self, folder: &str, options: ListOptions) -> StoreResult<Vec<String>> {
        tracing::debug!(folder, recursive = options.recursive, "listing files");
        Self::send_json(self.listing("files", folder, options)).await
    }

    async fn read_file(&self, path: &str) -> StoreResult<String> {
        tracing::debug!(path, "reading file");
        Self::send(
            self.request(Method::GET, "file-system/file")
                .query(&[("file", path)]),
        )
        .await?
        .text()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn download(&self, path: &str) -> StoreResult<Vec<u8>> {
        tracing::debug!(path, "downloading file");
        let bytes = Self::send(
            self.request(Method::GET, "file-system/file")
                .query(&[("file", path)]),
        )
        .await?
        .bytes()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn write_file(&self, path: &str, content: Vec<u8>) -> StoreResult<()> {
        tracing::debug!(path, bytes = content.len(), "writing file");
        let form = Form::new()
            .text("folder", paths::parent_of(path))
            .part(
                "file",
                Part::bytes(content).file_name(paths::name_of(path).to_string()),
            );
        Self::send_empty(self.request(Method::PUT, "file-system/file").multipart(form)).await
    }

    async fn create_folder(&self, path: &str) -> StoreResult<()> {
        Self::send_empty(
            self.request(Method::PUT, "file-system/folder")
                .json(&json!({ "folder": path })),
        )
        .await
    }

    async fn delete_file(&self, path: &str) -> StoreResult<()> {
        Self::send_empty(
            self.request(Method::DELETE, "file-system/file")
                .query(&[("file", path)]),
        )
        .await
    }

    async fn delete_folder(&self, path: &str) -> StoreResult<()> {
        Self::send_empty(
            self.request(Method::DELETE, "file-system/folder")
                .query(&[("folder", path)]),
        )
        .await
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> StoreResult<()> {
        Self::send_empty(
            self.request(Method::POST, "file-system/rename")
                .json(&json!({ "oldName": old_path, "newName": new_path })),
        )
        .await
    }

    async fn unzip(&self, path: &str) -> StoreResult<()> {
        Self::send_empty(
            self.request(Method::PUT, "file-system/unzip")
                .json(&json!({ "file": path })),
        )
        .await
    }

    async fn list_endpoints(&self) -> StoreResult<Vec<EndpointMeta>> {
        Self::send_json(self.request(Method::GET, "endpoints/list")).await
    }

    async fn list_macros(&self) -> StoreResult<Vec<String>> {
        let macros: Vec<MacroSummary> =
            Self::send_json(self.request(Method::GET, "ide/macros")).await?;
        Ok(macros.into_iter().map(|m| m.name).collect())
    }

    async fn get_macro(&self, name: &str) -> StoreResult<MacroDefinition> {
        Self::send_json(
            self.request(Method::GET, "ide/macro")
                .query(&[("name", name)]),
        )
        .await
    }

    async fn execute_macro(
        &self,
        name: &str,
        args: &BTreeMap<String, String>,
    ) -> StoreResult<MacroResponse> {
        tracing::debug!(name, ?args, "executing macro");
        Self::send_json(
            self.request(Method::POST, "ide/execute-macro")
                .json(&json!({ "macro": name, "args": args })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpFileStore {
        HttpFileStore::new(
            "https://api.example.com/",
            Some("secret".into()),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = store();
        assert_eq!(
            store.url("file-system/rename"),
            "https://api.example.com/magic/system/file-system/rename"
        );
    }

    #[test]
    fn listing_endpoints() {
        assert_eq!(listing_endpoint("folders", false), "file-system/list-folders");
        assert_eq!(
            listing_endpoint("files", true),
            "file-system/list-files-recursively"
        );
    }

    #[test]
    fn listing_request_carries_query_and_token() {
        let req = store()
            .listing(
                "folders",
                "/modules/",
                ListOptions {
                    recursive: true,
                    include_system: false,
                },
            )
            .build()
            .unwrap();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(
            req.url().as_str(),
            "https://api.example.com/magic/system/file-system/list-folders-recursively?folder=%2Fmodules%2F&sys=false"
        );
        assert_eq!(
            req.headers()
                .get(reqwest::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer secret")
        );
    }

    #[test]
    fn message_prefers_json_message() {
        assert_eq!(
            message_from_body(r#"{"message":"Folder exists"}"#, "Conflict"),
            "Folder exists"
        );
        assert_eq!(message_from_body("plain text", "Bad Request"), "plain text");
        assert_eq!(message_from_body("  ", "Not Found"), "Not Found");
        assert_eq!(message_from_body(r#"{"other":1}"#, "Bad"), r#"{"other":1}"#);
    }
}
