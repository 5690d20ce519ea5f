//! aimtrack — session-and-entry storage for a whitelisted aim-training tracker.
//!
//! Players from a static whitelist authenticate with a password, receive an
//! opaque bearer token, and read/write a per-day ledger of training scores.
//! Everything persists through the [`store::BlobStore`] seam as namespaced
//! JSON blobs (`auth:`, `session:`, `data:`).

pub mod auth;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod store;
