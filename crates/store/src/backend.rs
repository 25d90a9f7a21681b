use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{fs, sync::RwLock};

use crate::errors::{StoreError, StoreResult};

/// Raw key-value persistence underneath the collection store.
/// Implementations can be file-backed, in-memory, or remote.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the blob stored under `key`; `None` when absent or unreadable.
    async fn read(&self, key: &str) -> Option<Value>;
    /// Write the blob stored under `key`.
    async fn write(&self, key: &str, value: &Value) -> StoreResult<()>;
    /// Remove the blob stored under `key`; absent keys are not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// File-backed backend persisting each key as `<dir>/<key>.json`.
#[derive(Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Initialize the backend rooted at `dir`, creating it when missing.
    pub async fn new<P: Into<PathBuf>>(dir: P) -> StoreResult<Arc<Self>> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(Arc::new(Self { dir }))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    async fn read(&self, key: &str) -> Option<Value> {
        let bytes = fs::read(self.path_for(key)).await.ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    async fn write(&self, key: &str, value: &Value) -> StoreResult<()> {
        let data = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(self.path_for(key), data)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Storage(e.to_string())),
        }
    }
}

/// In-memory backend for tests and ephemeral mode.
#[derive(Default)]
pub struct MemoryBackend {
    inner: RwLock<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Option<Value> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    async fn write(&self, key: &str, value: &Value) -> StoreResult<()> {
        let mut map = self.inner.write().await;
        map.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut map = self.inner.write().await;
        map.remove(key);
        Ok(())
    }
}
