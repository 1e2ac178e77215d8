//! Hashing primitives: SHA-256 content hashing and hex checks.
//!
//! This crate never signs or verifies signatures. Signing belongs to the
//! external signer; here we only derive and compare content hashes.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::canonical::canonical_bytes;
use crate::event::UnsignedEvent;
use crate::types::EventId;

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256({}...)", &self.to_hex()[..8])
    }
}

impl From<Sha256Hash> for EventId {
    fn from(hash: Sha256Hash) -> Self {
        EventId(hash.0)
    }
}

/// Compute the content hash ("event id") of an event.
///
/// Deterministic and pure: identical logical events, including tag order,
/// always produce the same id.
pub fn compute_event_id(event: &UnsignedEvent) -> EventId {
    Sha256Hash::hash(&canonical_bytes(event)).into()
}

/// Check that `value` is a hex string of exactly `expected_len` characters.
///
/// Case-insensitive, like the signers that produce these fields.
pub fn is_hex(value: &str, expected_len: usize) -> bool {
    value.len() == expected_len && value.bytes().all(|b| b.is_ascii_hexdigit())
}
