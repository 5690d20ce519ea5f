//! TOML configuration with serde defaults.
//!
//! Every field has a default so a missing or partial config file still yields
//! a runnable service. The admin secret can also come from the
//! `AIMTRACK_ADMIN_SECRET` environment variable, which takes precedence over
//! the config file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[auth] admin_secret`.
pub const ADMIN_SECRET_ENV: &str = "AIMTRACK_ADMIN_SECRET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend name: "sqlite" (durable) or "memory" (ephemeral).
    pub backend: String,
    /// Database path for the sqlite backend.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".into(),
            path: PathBuf::from("aimtrack.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared administrative secret for player initialization.
    /// `AIMTRACK_ADMIN_SECRET` takes precedence when set.
    pub admin_secret: Option<String>,
    /// Whitelist file: `{ "players": ["alice", ...] }`.
    pub whitelist_path: PathBuf,
    pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_secret: None,
            whitelist_path: PathBuf::from("players.json"),
            session_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Entries older than this many days (relative to save time) are dropped.
    pub retention_days: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { retention_days: 60 }
    }
}

impl Config {
    /// Load from a TOML file, or fall back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config file at {} — using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Effective admin secret: environment variable wins over the config file.
    /// Blank values count as unset.
    pub fn admin_secret(&self) -> Option<String> {
        std::env::var(ADMIN_SECRET_ENV)
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.auth
                    .admin_secret
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned)
            })
    }
}
