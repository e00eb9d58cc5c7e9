use std::collections::HashSet;

use crate::error::Result;
use crate::ide::paths;
use crate::store::{EndpointMeta, FileStore};

/// HTTP endpoints known to the backend, keyed by `(url, verb)`.
#[derive(Debug, Default)]
pub struct EndpointIndex {
    endpoints: HashSet<EndpointMeta>,
}

impl EndpointIndex {
    pub async fn refresh(&mut self, store: &dyn FileStore) -> Result<()> {
        let endpoints = store.list_endpoints().await?;
        tracing::debug!(count = endpoints.len(), "refreshed endpoints");
        self.replace(endpoints);
        Ok(())
    }

    pub fn replace(&mut self, endpoints: Vec<EndpointMeta>) {
        self.endpoints = endpoints
            .into_iter()
            .map(|e| EndpointMeta {
                path: e.path.trim_start_matches('/').to_string(),
                verb: e.verb.to_lowercase(),
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Whether the file at `path` is served as an HTTP endpoint.
    pub fn is_endpoint(&self, path: &str) -> bool {
        match paths::endpoint_of(path) {
            Some((url, verb)) => self.endpoints.contains(&EndpointMeta { path: url, verb }),
            None => false,
        }
    }
}
