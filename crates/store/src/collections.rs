use std::{path::PathBuf, sync::Arc};

use serde_json::Value;
use tracing::warn;

use crate::backend::{JsonFileBackend, MemoryBackend, StorageBackend};
use crate::errors::StoreResult;
use crate::keys;
use crate::query::QueryBuilder;
use crate::Record;

/// Named-collection store over a [`StorageBackend`].
///
/// Constructed explicitly and passed by `Arc`; there is no ambient global
/// store. Reads never fail: an unavailable or corrupt backing key loads as
/// an empty collection. Writes that the backend rejects are logged at
/// `warn` and dropped, so callers cannot distinguish an unavailable store
/// from an empty one.
#[derive(Clone)]
pub struct CollectionStore {
    backend: Arc<dyn StorageBackend>,
}

impl CollectionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Arc<Self> {
        Arc::new(Self { backend })
    }

    /// Open a file-backed store rooted at `dir`.
    pub async fn open<P: Into<PathBuf>>(dir: P) -> StoreResult<Arc<Self>> {
        let backend = JsonFileBackend::new(dir).await?;
        Ok(Self::new(backend))
    }

    /// Ephemeral store; collections live only as long as the process.
    pub fn in_memory() -> Arc<Self> {
        Self::new(MemoryBackend::new())
    }

    /// Start a query against one named collection. No I/O happens until a
    /// terminal builder method runs.
    pub fn from(&self, collection: &str) -> QueryBuilder<'_> {
        QueryBuilder::new(self, collection)
    }

    /// Load a collection as rows. Non-array blobs and non-object items are
    /// discarded with a warning.
    pub(crate) async fn rows(&self, collection: &str) -> Vec<Record> {
        match self.backend.read(collection).await {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    other => {
                        warn!(%collection, ?other, "skipping non-object row");
                        None
                    }
                })
                .collect(),
            Some(_) => {
                warn!(%collection, "stored blob is not an array; reading as empty");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Persist a full collection. Backend failures degrade to a dropped
    /// write with a warning.
    pub(crate) async fn replace(&self, collection: &str, rows: Vec<Record>) {
        let blob = Value::Array(rows.into_iter().map(Value::Object).collect());
        if let Err(e) = self.backend.write(collection, &blob).await {
            warn!(%collection, error = %e, "storage unavailable; write dropped");
        }
    }

    /// Current session marker, if a login is active.
    pub async fn session(&self) -> Option<Value> {
        self.backend.read(keys::CURRENT_USER).await
    }

    /// Overwrite the session marker.
    pub async fn set_session(&self, marker: Value) {
        if let Err(e) = self.backend.write(keys::CURRENT_USER, &marker).await {
            warn!(error = %e, "storage unavailable; session not persisted");
        }
    }

    /// Remove the session marker.
    pub async fn clear_session(&self) {
        if let Err(e) = self.backend.remove(keys::CURRENT_USER).await {
            warn!(error = %e, "storage unavailable; session not cleared");
        }
    }

    /// True when the collection holds no rows.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.rows(collection).await.is_empty()
    }
}
