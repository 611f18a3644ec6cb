//! Key-value storage backend trait and error types.
//!
//! This module defines the `KeyValueBackend` trait that abstracts over
//! storage implementations (SQLite on device, in-memory for tests). Values
//! are JSON strings keyed by well-known string keys; see [`crate::keys`].

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage failure (database, filesystem).
    #[error("Storage error: {0}")]
    Backend(String),

    /// A persisted value failed to (de)serialize.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for key-value storage backends.
///
/// Implementations are synchronous; [`crate::StoreClient`] provides the
/// async interface and handles thread-safe access via a mutex, so
/// implementations don't need to be `Sync`.
///
/// A missing key is `Ok(None)`, never an error.
pub trait KeyValueBackend: Send {
    /// Read the raw JSON string under `key`.
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write the raw JSON string under `key`, replacing any previous value.
    fn put_raw(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// List all present keys.
    fn keys(&self) -> StoreResult<Vec<String>>;
}
