//! Canonical serialization for content hashing.
//!
//! The canonical form of an event is the compact JSON array
//!
//! ```text
//! [0, <pubkey>, <created_at>, <kind>, <tags>, <content>]
//! ```
//!
//! with no whitespace, UTF-8 left unescaped, and the standard JSON string
//! escapes (`\"`, `\\`, `\n`, `\r`, `\t`, `\b`, `\f`, `\u00XX` for the
//! remaining control characters). Tags keep their order.
//!
//! **CRITICAL**: This encoding is shared with every relay and signer on the
//! network. Changing it breaks every event id.

use serde::Serialize;

use crate::event::{Kind, Tag, UnsignedEvent};

/// Leading marker of the canonical array.
const CANONICAL_MARKER: u8 = 0;

#[derive(Serialize)]
struct CanonicalForm<'a>(u8, &'a str, u64, Kind, &'a [Tag], &'a str);

/// Encode an event's hashed fields to canonical bytes.
pub fn canonical_bytes(event: &UnsignedEvent) -> Vec<u8> {
    let form = CanonicalForm(
        CANONICAL_MARKER,
        &event.pubkey,
        event.created_at,
        event.kind,
        &event.tags,
        &event.content,
    );
    // Serializing strings, integers and string arrays to a Vec cannot fail.
    serde_json::to_vec(&form).unwrap_or_default()
}

/// Canonical serialization of a tag list alone.
///
/// Used to compare tags between a draft and its signed form.
pub fn canonical_tags(tags: &[Tag]) -> Vec<u8> {
    serde_json::to_vec(tags).unwrap_or_default()
}
