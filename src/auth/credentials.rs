//! Credential records: admin-initialized, SHA-256 verified.
//!
//! One record per pseudo at `auth:<pseudo>`. Initialization is an
//! administrative override — it unconditionally replaces any prior record,
//! so re-running it for an existing player is the supported reset path.

use crate::auth::constant_time_eq;
use crate::store::BlobStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

/// Minimum pseudo length accepted by `initialize`.
pub const MIN_PSEUDO_LEN: usize = 2;
/// Minimum password length accepted by `initialize`.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("pseudo >=2 and password >=6 required")]
    InvalidInput,
    #[error("Password not initialized for this pseudo. Use admin_init_player first.")]
    NotInitialized,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Persisted credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub pseudo: String,
    pub password_hash: String,
    pub updated_at: DateTime<Utc>,
}

pub struct CredentialStore {
    store: Arc<dyn BlobStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    fn key(pseudo: &str) -> String {
        format!("auth:{pseudo}")
    }

    /// Create or overwrite the credential record for `pseudo`.
    ///
    /// Whitelist membership is the caller's responsibility — this store only
    /// enforces the length floor.
    pub async fn initialize(&self, pseudo: &str, password: &str) -> Result<(), CredentialError> {
        if pseudo.len() < MIN_PSEUDO_LEN || password.len() < MIN_PASSWORD_LEN {
            return Err(CredentialError::InvalidInput);
        }

        let record = CredentialRecord {
            pseudo: pseudo.to_owned(),
            password_hash: hash_password(password),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&record).map_err(anyhow::Error::from)?;
        self.store.set(&Self::key(pseudo), value).await?;

        tracing::info!(pseudo, "Credential record initialized");
        Ok(())
    }

    /// Check `password` against the stored hash for `pseudo`.
    ///
    /// `Err(NotInitialized)` when no record exists; `Ok(false)` on mismatch.
    pub async fn verify(&self, pseudo: &str, password: &str) -> Result<bool, CredentialError> {
        let blob = self
            .store
            .get(&Self::key(pseudo))
            .await?
            .ok_or(CredentialError::NotInitialized)?;
        let record: CredentialRecord =
            serde_json::from_value(blob).map_err(|_| CredentialError::NotInitialized)?;

        let attempt = hash_password(password);
        Ok(constant_time_eq(
            attempt.as_bytes(),
            record.password_hash.as_bytes(),
        ))
    }
}

/// Deterministic one-way digest of a plaintext credential (SHA-256 hex).
///
/// Unsalted and single-round by contract — records written by earlier
/// deployments must keep verifying.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
