//! SQLite-backed blob store.
//!
//! One `kv` table holds every record; values are JSON text. WAL mode keeps
//! reads concurrent while SQLite's own page lock serializes writes.

use super::BlobStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;

pub struct SqliteBlobStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteBlobStore {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(db_path)
            .with_context(|| format!("Failed to open store at {}", db_path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn.lock();
        let row: Result<String, _> = conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
        );

        match row {
            Ok(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Corrupt blob at key {key}"))?;
                Ok(Some(value))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let raw = serde_json::to_string(&value)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, raw],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteBlobStore) {
        let tmp = TempDir::new().unwrap();
        let store = SqliteBlobStore::open(&tmp.path().join("kv.db")).unwrap();
        (tmp, store)
    }

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let (_tmp, store) = test_store();
        assert!(store.get("auth:ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let (_tmp, store) = test_store();
        let blob = serde_json::json!({"pseudo": "alice", "entries": []});
        store.set("data:alice", blob.clone()).await.unwrap();
        assert_eq!(store.get("data:alice").await.unwrap(), Some(blob));
    }

    #[tokio::test]
    async fn set_replaces_previous_value_in_full() {
        let (_tmp, store) = test_store();
        store
            .set("auth:alice", serde_json::json!({"v": 1}))
            .await
            .unwrap();
        store
            .set("auth:alice", serde_json::json!({"v": 2}))
            .await
            .unwrap();
        let got = store.get("auth:alice").await.unwrap().unwrap();
        assert_eq!(got["v"], 2);
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("kv.db");
        {
            let store = SqliteBlobStore::open(&db_path).unwrap();
            store
                .set("session:tok", serde_json::json!({"pseudo": "alice"}))
                .await
                .unwrap();
        }
        let store = SqliteBlobStore::open(&db_path).unwrap();
        let got = store.get("session:tok").await.unwrap().unwrap();
        assert_eq!(got["pseudo"], "alice");
    }
}
