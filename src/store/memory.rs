//! In-memory blob store — ephemeral backend for tests and throwaway runs.

use super::BlobStore;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.entries.lock().insert(key.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get() {
        let store = MemoryBlobStore::new();
        assert!(store.get("k").await.unwrap().is_none());

        store.set("k", serde_json::json!(42)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(serde_json::json!(42)));

        store.set("k", serde_json::json!(43)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(serde_json::json!(43)));
    }
}
