//! Strong type definitions for Clipnote.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Length of a hex-encoded public key.
pub const PUBKEY_HEX_LEN: usize = 64;

/// Length of a hex-encoded event id.
pub const EVENT_ID_HEX_LEN: usize = 64;

/// Length of a hex-encoded signature.
pub const SIGNATURE_HEX_LEN: usize = 128;

/// A 32-byte event identifier, computed as SHA-256(canonical_bytes(event)).
///
/// This is the content-address of an event. Two events with the same
/// canonical content will have the same EventId.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub [u8; 32]);

impl EventId {
    /// Create a new EventId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)
            .map_err(|e| CoreError::InvalidHex(format!("{}: {}", s, e)))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for EventId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for EventId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_hex_roundtrip() {
        let id = EventId::from_bytes([0x42; 32]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), EVENT_ID_HEX_LEN);
        let recovered = EventId::from_hex(&hex).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_event_id_rejects_bad_hex() {
        assert!(matches!(EventId::from_hex("abcd"), Err(CoreError::InvalidHex(_))));
        assert!(EventId::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_event_id_debug() {
        let id = EventId::from_bytes([0xcd; 32]);
        let debug = format!("{:?}", id);
        assert_eq!(debug, "EventId(cdcdcdcdcdcdcdcd)");
    }
}
