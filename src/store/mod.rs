//! Persistence seam: a durable mapping from string key to JSON blob.
//!
//! The rest of the crate never touches a database directly — credential,
//! session, and ledger records all go through [`BlobStore`], namespaced by
//! key prefix (`auth:<pseudo>`, `session:<token>`, `data:<pseudo>`). The
//! store offers no transactions; read-modify-write sequences are not atomic.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBlobStore;
pub use sqlite::SqliteBlobStore;

use crate::config::StoreConfig;
use anyhow::{bail, Result};
use async_trait::async_trait;

/// Key-value store of JSON blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Backend name for logs and health reporting.
    fn name(&self) -> &str;

    /// Fetch the blob at `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Write `value` at `key`, replacing any previous blob in full.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Create a store backend from config.
pub fn create_store(config: &StoreConfig) -> Result<Box<dyn BlobStore>> {
    match config.backend.as_str() {
        "sqlite" => Ok(Box::new(SqliteBlobStore::open(&config.path)?)),
        "memory" => Ok(Box::new(MemoryBlobStore::new())),
        other => bail!("Unknown store backend: {other} (expected \"sqlite\" or \"memory\")"),
    }
}
