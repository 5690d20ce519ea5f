//! Static whitelist of allowed player pseudos.
//!
//! Loaded once at startup from a `players.json` file of the form
//! `{ "players": ["alice", "bob"] }` — the same asset the web frontend
//! ships. Membership is an exact string test; the set never mutates.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PlayersFile {
    #[serde(default)]
    players: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    players: HashSet<String>,
}

impl Whitelist {
    /// Load from a `players.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read whitelist at {}", path.display()))?;
        let parsed: PlayersFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse whitelist at {}", path.display()))?;
        Ok(Self::from_players(parsed.players))
    }

    /// Build from an explicit set of pseudos (config- or test-injected).
    pub fn from_players<I, S>(players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            players: players.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed(&self, pseudo: &str) -> bool {
        self.players.contains(pseudo)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_exact() {
        let whitelist = Whitelist::from_players(["alice", "bob"]);
        assert!(whitelist.is_allowed("alice"));
        assert!(!whitelist.is_allowed("Alice"));
        assert!(!whitelist.is_allowed("mallory"));
    }

    #[test]
    fn loads_players_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("players.json");
        std::fs::write(&path, r#"{"players": ["alice", "bob"]}"#).unwrap();

        let whitelist = Whitelist::load(&path).unwrap();
        assert_eq!(whitelist.len(), 2);
        assert!(whitelist.is_allowed("bob"));
    }

    #[test]
    fn missing_players_field_means_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("players.json");
        std::fs::write(&path, r#"{}"#).unwrap();

        let whitelist = Whitelist::load(&path).unwrap();
        assert!(whitelist.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("players.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(Whitelist::load(&path).is_err());
    }
}
