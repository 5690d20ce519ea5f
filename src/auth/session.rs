//! Bearer sessions: opaque tokens with absolute expiry.
//!
//! `issue` writes `{ pseudo, expires_at }` at `session:<token>` and never
//! touches other sessions for the same pseudo — concurrent logins coexist.
//! `validate` re-checks expiry on every call (soft TTL): expired records
//! stay in the store but are treated as invalid. There is no refresh and
//! no revocation; logout is client-side.

use crate::store::BlobStore;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Token byte length before hex encoding (32 bytes = 256 bits of entropy).
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid session")]
    InvalidSession,
    #[error("Session expired")]
    SessionExpired,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Persisted session record, keyed by the opaque token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub pseudo: String,
    pub expires_at: DateTime<Utc>,
}

/// What a successful login hands back to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub pseudo: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionAuthority {
    store: Arc<dyn BlobStore>,
    ttl: Duration,
}

impl SessionAuthority {
    pub fn new(store: Arc<dyn BlobStore>, ttl_hours: i64) -> Self {
        Self {
            store,
            ttl: Duration::hours(ttl_hours),
        }
    }

    fn key(token: &str) -> String {
        format!("session:{token}")
    }

    /// Issue a fresh session for `pseudo`. The plaintext token is only ever
    /// returned here.
    pub async fn issue(&self, pseudo: &str) -> Result<IssuedSession, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + self.ttl;

        let record = SessionRecord {
            pseudo: pseudo.to_owned(),
            expires_at,
        };
        let value = serde_json::to_value(&record).map_err(anyhow::Error::from)?;
        self.store.set(&Self::key(&token), value).await?;

        tracing::debug!(pseudo, %expires_at, "Session issued");
        Ok(IssuedSession {
            token,
            pseudo: pseudo.to_owned(),
            expires_at,
        })
    }

    /// Resolve a bearer token to its pseudo, re-checking expiry.
    pub async fn validate(&self, token: &str) -> Result<String, AuthError> {
        self.validate_at(token, Utc::now()).await
    }

    /// Expiry check against an explicit clock. Expiry is absolute from
    /// issuance — a session seen at `now >= expires_at` is gone for good.
    pub(crate) async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let blob = self
            .store
            .get(&Self::key(token))
            .await?
            .ok_or(AuthError::InvalidSession)?;
        // A record missing required fields is as invalid as no record at all.
        let record: SessionRecord =
            serde_json::from_value(blob).map_err(|_| AuthError::InvalidSession)?;

        if now >= record.expires_at {
            return Err(AuthError::SessionExpired);
        }
        Ok(record.pseudo)
    }
}

/// Generate a random session token (hex-encoded).
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
