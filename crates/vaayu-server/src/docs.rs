//! Append-only document store.
//!
//! Stands in for the hosted document database behind the feedback
//! endpoint: JSON documents appended per collection, listed most recent
//! first.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde_json::Value;

/// SQLite-backed document store.
#[derive(Clone)]
pub struct DocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentStore {
    /// Open (or create) the store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection
                ON documents(collection, created_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// Append a document to a collection, returning its row id.
    pub async fn add(&self, collection: &str, body: &Value) -> Result<i64> {
        let conn = self.conn.clone();
        let collection = collection.to_string();
        let body = serde_json::to_string(body)?;

        tokio::task::spawn_blocking(move || -> Result<i64> {
            let now = chrono::Utc::now().timestamp_millis();
            let conn = conn.lock();
            conn.execute(
                "INSERT INTO documents (collection, body, created_at) VALUES (?1, ?2, ?3)",
                params![collection, body, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await?
    }

    /// All documents in a collection, most recent first.
    pub async fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let conn = self.conn.clone();
        let collection = collection.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<Value>> {
            let conn = conn.lock();
            let mut stmt = conn.prepare(
                "SELECT body FROM documents WHERE collection = ?1 ORDER BY created_at DESC, id DESC",
            )?;

            let rows = stmt.query_map(params![collection], |row| row.get::<_, String>(0))?;
            let mut documents = Vec::new();
            for row in rows {
                documents.push(serde_json::from_str(&row?)?);
            }
            Ok(documents)
        })
        .await?
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> Result<i64> {
        let conn = self.conn.clone();
        let collection = collection.to_string();

        tokio::task::spawn_blocking(move || -> Result<i64> {
            let count = conn.lock().query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await?
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DocumentStore").finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[tokio::test]
    async fn test_add_and_list() {
        let store = DocumentStore::in_memory().unwrap();

        store
            .add("user_feedback", &serde_json::json!({"alertId": "a1"}))
            .await
            .unwrap();
        store
            .add("user_feedback", &serde_json::json!({"alertId": "a2"}))
            .await
            .unwrap();
        store
            .add("other", &serde_json::json!({"x": 1}))
            .await
            .unwrap();

        let docs = store.list("user_feedback").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["alertId"], "a2");
        assert_eq!(docs[1]["alertId"], "a1");

        assert_eq!(store.count("user_feedback").await.unwrap(), 2);
        assert_eq!(store.count("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.db");

        {
            let store = DocumentStore::new(&path).unwrap();
            store
                .add("user_feedback", &serde_json::json!({"alertId": "a1"}))
                .await
                .unwrap();
        }

        let store = DocumentStore::new(&path).unwrap();
        assert_eq!(store.count("user_feedback").await.unwrap(), 1);
    }
}
