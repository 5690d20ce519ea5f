//! Per-player ledger of daily training entries.
//!
//! One entry per calendar day; a save for an existing date replaces that
//! day. Every write re-applies the rolling retention window and re-sorts,
//! then persists the whole ledger last-writer-wins — the blob store has no
//! transactions, so two simultaneous saves for one player race and the
//! later write determines the final state.

use crate::store::BlobStore;
use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The six weapons of the training program, in wire (snake_case) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    Glock,
    UspS,
    M4a4,
    M4a1S,
    Ak47,
    Galil,
}

/// One day of measurements. `kpm_immobile` / `kpm_cs` are kills-per-minute
/// against immobile and counter-strafing bots; either may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,
    pub weapon: Weapon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpm_immobile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpm_cs: Option<f64>,
}

/// Persisted ledger at `data:<pseudo>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLedger {
    pub pseudo: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl PlayerLedger {
    pub fn empty(pseudo: &str) -> Self {
        Self {
            pseudo: pseudo.to_owned(),
            entries: Vec::new(),
        }
    }
}

pub struct EntryLedger {
    store: Arc<dyn BlobStore>,
    retention_days: i64,
}

impl EntryLedger {
    pub fn new(store: Arc<dyn BlobStore>, retention_days: i64) -> Self {
        Self {
            store,
            retention_days,
        }
    }

    fn key(pseudo: &str) -> String {
        format!("data:{pseudo}")
    }

    /// Fetch the ledger for `pseudo`, or the empty default when none exists.
    pub async fn get(&self, pseudo: &str) -> Result<PlayerLedger> {
        match self.store.get(&Self::key(pseudo)).await? {
            Some(blob) => Ok(serde_json::from_value(blob)?),
            None => Ok(PlayerLedger::empty(pseudo)),
        }
    }

    /// Insert or replace the entry for its date, then persist.
    pub async fn upsert(&self, pseudo: &str, entry: Entry) -> Result<PlayerLedger> {
        self.upsert_at(pseudo, entry, Utc::now().date_naive()).await
    }

    /// Upsert with an explicit "today" for the retention cutoff.
    ///
    /// The cutoff is calendar subtraction from save time, not entry-relative:
    /// an entry dated exactly `retention_days` ago survives, one day older
    /// does not.
    pub(crate) async fn upsert_at(
        &self,
        pseudo: &str,
        entry: Entry,
        today: NaiveDate,
    ) -> Result<PlayerLedger> {
        let mut ledger = self.get(pseudo).await?;

        let cutoff = today - Duration::days(self.retention_days);
        ledger.entries.retain(|e| e.date != entry.date);
        ledger.entries.push(entry);
        ledger.entries.retain(|e| e.date >= cutoff);
        ledger.entries.sort_by_key(|e| e.date);

        let value = serde_json::to_value(&ledger)?;
        self.store.set(&Self::key(pseudo), value).await?;

        tracing::debug!(pseudo, entries = ledger.entries.len(), "Ledger updated");
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BlobStore, MemoryBlobStore};

    fn test_ledger() -> EntryLedger {
        EntryLedger::new(Arc::new(MemoryBlobStore::new()), 60)
    }

    fn test_ledger_with_store() -> (Arc<MemoryBlobStore>, EntryLedger) {
        let store = Arc::new(MemoryBlobStore::new());
        let ledger = EntryLedger::new(store.clone(), 60);
        (store, ledger)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(date: &str, weapon: Weapon, kpm: f64) -> Entry {
        Entry {
            date: day(date),
            weapon,
            kpm_immobile: Some(kpm),
            kpm_cs: None,
        }
    }

    #[tokio::test]
    async fn get_without_ledger_returns_empty_default() {
        let ledger = test_ledger();
        let got = ledger.get("alice").await.unwrap();
        assert_eq!(got, PlayerLedger::empty("alice"));
    }

    #[tokio::test]
    async fn upsert_replaces_same_date_entry() {
        let ledger = test_ledger();
        let today = day("2024-01-15");

        ledger
            .upsert_at("alice", entry("2024-01-10", Weapon::Ak47, 1.5), today)
            .await
            .unwrap();
        let got = ledger
            .upsert_at("alice", entry("2024-01-10", Weapon::Glock, 2.0), today)
            .await
            .unwrap();

        assert_eq!(got.entries.len(), 1);
        assert_eq!(got.entries[0].weapon, Weapon::Glock);
        assert_eq!(got.entries[0].kpm_immobile, Some(2.0));
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let ledger = test_ledger();
        let today = day("2024-01-15");
        let e = entry("2024-01-10", Weapon::Ak47, 1.5);

        ledger.upsert_at("alice", e.clone(), today).await.unwrap();
        let got = ledger.upsert_at("alice", e.clone(), today).await.unwrap();

        assert_eq!(got.entries, vec![e]);
    }

    #[tokio::test]
    async fn retention_drops_61_days_keeps_60() {
        let (store, ledger) = test_ledger_with_store();
        let today = day("2024-03-01");
        let just_inside = today - Duration::days(60);
        let just_outside = today - Duration::days(61);

        // Seed a persisted ledger that predates the cutoff.
        let seeded = PlayerLedger {
            pseudo: "alice".into(),
            entries: vec![
                entry(&just_outside.to_string(), Weapon::Galil, 1.0),
                entry(&just_inside.to_string(), Weapon::Galil, 1.1),
            ],
        };
        store
            .set("data:alice", serde_json::to_value(&seeded).unwrap())
            .await
            .unwrap();

        let got = ledger
            .upsert_at("alice", entry("2024-03-01", Weapon::Ak47, 1.2), today)
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = got.entries.iter().map(|e| e.date).collect();
        assert!(!dates.contains(&just_outside));
        assert!(dates.contains(&just_inside));
        assert!(dates.contains(&today));
    }

    #[tokio::test]
    async fn entries_stay_sorted_ascending() {
        let ledger = test_ledger();
        let today = day("2024-01-20");

        for date in ["2024-01-12", "2024-01-03", "2024-01-18", "2024-01-07"] {
            ledger
                .upsert_at("alice", entry(date, Weapon::M4a4, 1.0), today)
                .await
                .unwrap();
        }

        let got = ledger.get("alice").await.unwrap();
        let dates: Vec<NaiveDate> = got.entries.iter().map(|e| e.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(dates.len(), 4);
    }

    #[tokio::test]
    async fn ledgers_are_per_player() {
        let ledger = test_ledger();
        let today = day("2024-01-15");

        ledger
            .upsert_at("alice", entry("2024-01-10", Weapon::Ak47, 1.5), today)
            .await
            .unwrap();

        let bob = ledger.get("bob").await.unwrap();
        assert!(bob.entries.is_empty());
    }

    #[test]
    fn weapon_wire_names_match_frontend() {
        for (weapon, wire) in [
            (Weapon::Glock, "\"glock\""),
            (Weapon::UspS, "\"usp_s\""),
            (Weapon::M4a4, "\"m4a4\""),
            (Weapon::M4a1S, "\"m4a1_s\""),
            (Weapon::Ak47, "\"ak47\""),
            (Weapon::Galil, "\"galil\""),
        ] {
            assert_eq!(serde_json::to_string(&weapon).unwrap(), wire);
        }
        assert!(serde_json::from_str::<Weapon>("\"awp\"").is_err());
    }

    #[test]
    fn entry_kpm_fields_accept_null_and_absent() {
        let e: Entry =
            serde_json::from_str(r#"{"date": "2024-01-10", "weapon": "ak47"}"#).unwrap();
        assert!(e.kpm_immobile.is_none());

        let e: Entry = serde_json::from_str(
            r#"{"date": "2024-01-10", "weapon": "ak47", "kpm_immobile": null, "kpm_cs": 1.2}"#,
        )
        .unwrap();
        assert!(e.kpm_immobile.is_none());
        assert_eq!(e.kpm_cs, Some(1.2));
    }
}
