//! Storage locations the loaders probe for list and level payloads.
//!
//! A store only knows how to hand back the raw bytes of a named resource; decoding
//! and fallback between stores belong to the loaders.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Why a single store could not produce a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("I/O error reading {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request for {resource} failed: {reason}")]
    Http { resource: String, reason: String },
    #[error("{resource} timed out after {elapsed:?}")]
    Timeout { resource: String, elapsed: Duration },
}

/// An ordered search path entry: a place that can be asked for a resource by name.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short human readable name used in logs and provenance.
    fn label(&self) -> &str;

    /// Fetch the raw bytes of `resource` (for example `_list.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is absent or unreadable.
    async fn fetch(&self, resource: &str) -> Result<Vec<u8>, FetchError>;
}

/// In-process store, mostly for embedding fixed data and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    label: String,
    resources: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            resources: RwLock::new(HashMap::new()),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(self, resource: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(resource, body);
        self
    }

    pub fn insert(&self, resource: impl Into<String>, body: impl Into<Vec<u8>>) {
        if let Ok(mut resources) = self.resources.write() {
            resources.insert(resource.into(), body.into());
        }
    }

    pub fn remove(&self, resource: &str) {
        if let Ok(mut resources) = self.resources.write() {
            resources.remove(resource);
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, resource: &str) -> Result<Vec<u8>, FetchError> {
        self.resources
            .read()
            .ok()
            .and_then(|resources| resources.get(resource).cloned())
            .ok_or_else(|| FetchError::NotFound {
                resource: resource.to_string(),
            })
    }
}

/// A data directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirStore {
    label: String,
    root: PathBuf,
}

impl DirStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            label: root.display().to_string(),
            root,
        }
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl Store for DirStore {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, resource: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(resource);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                resource: path.display().to_string(),
            }),
            Err(source) => Err(FetchError::Io {
                resource: path.display().to_string(),
                source,
            }),
        }
    }
}
