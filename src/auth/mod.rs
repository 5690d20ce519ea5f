//! Authentication: whitelist gate, credential records, bearer sessions.
//!
//! ## Design Decisions
//! - No external JWT dependency — sessions use opaque random tokens with
//!   server-side lookup under `session:<token>`.
//! - Sessions carry an absolute expiry and are re-checked on every use
//!   (soft TTL); records are never proactively deleted and there is no
//!   server-side revocation.
//! - Credential digests are unsalted single-round SHA-256 for compatibility
//!   with existing records; see DESIGN.md before deploying anywhere hostile.

pub mod credentials;
pub mod session;
pub mod whitelist;

pub use credentials::{CredentialError, CredentialStore};
pub use session::{AuthError, IssuedSession, SessionAuthority};
pub use whitelist::Whitelist;

/// Constant-time byte comparison to prevent timing attacks.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
