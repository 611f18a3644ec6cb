//! Async, typed client over a key-value backend.
//!
//! Backends are synchronous (SQLite blocks); `StoreClient` serializes
//! access through a mutex and moves the blocking work onto the tokio
//! blocking pool, exposing typed JSON get/put.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{KeyValueBackend, StoreError, StoreResult};
use crate::memory::MemoryStore;
use crate::sqlite::SqliteStore;

/// Cloneable async handle to the local persistent store.
#[derive(Clone)]
pub struct StoreClient {
    backend: Arc<Mutex<Box<dyn KeyValueBackend>>>,
}

impl StoreClient {
    /// Wrap an arbitrary backend.
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            backend: Arc::new(Mutex::new(Box::new(backend))),
        }
    }

    /// Open (or create) the SQLite store at `path`.
    pub fn sqlite<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self::new(SqliteStore::new(path)?))
    }

    /// Ephemeral in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Read and deserialize the value under `key`.
    ///
    /// Missing keys are `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let backend = self.backend.clone();
        let key_owned = key.to_string();

        let raw = tokio::task::spawn_blocking(move || backend.lock().get_raw(&key_owned))
            .await
            .map_err(|e| StoreError::backend(format!("store task failed: {e}")))??;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Serialize and write `value` under `key`.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value)?;
        let backend = self.backend.clone();
        let key_owned = key.to_string();

        tokio::task::spawn_blocking(move || backend.lock().put_raw(&key_owned, &json))
            .await
            .map_err(|e| StoreError::backend(format!("store task failed: {e}")))?
    }

    /// Remove `key`. Removing a missing key is a no-op.
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        let backend = self.backend.clone();
        let key_owned = key.to_string();

        tokio::task::spawn_blocking(move || backend.lock().remove(&key_owned))
            .await
            .map_err(|e| StoreError::backend(format!("store task failed: {e}")))?
    }

    /// List all present keys.
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let backend = self.backend.clone();

        tokio::task::spawn_blocking(move || backend.lock().keys())
            .await
            .map_err(|e| StoreError::backend(format!("store task failed: {e}")))?
    }
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StoreClient").finish()
    }
}
