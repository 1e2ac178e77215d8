//! Event: the signed social note that is broadcast to relays.
//!
//! An event starts life as an [`UnsignedEvent`] draft built locally. The
//! external signer turns it into a [`SignedEvent`] by adding the content hash
//! and a signature. Neither form is edited after construction; a change is a
//! new event.

use serde::{Deserialize, Serialize};

use crate::crypto::compute_event_id;
use crate::error::CoreError;
use crate::types::EventId;

/// Category tag of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(pub u32);

impl Kind {
    /// Short text note.
    pub const TEXT_NOTE: Kind = Kind(1);

    /// Get the raw number.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl Default for Kind {
    fn default() -> Self {
        Self::TEXT_NOTE
    }
}

impl From<u32> for Kind {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A labeled tag: the first element is the label, the rest are values.
///
/// Tag order inside an event is meaningful and is never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// Create a tag from a label and its values.
    pub fn new<I, S>(label: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = vec![label.to_string()];
        parts.extend(values.into_iter().map(Into::into));
        Self(parts)
    }

    /// Get the label, if any.
    pub fn label(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Get the first value after the label.
    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }
}

/// A draft event awaiting a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    /// Category tag.
    pub kind: Kind,

    /// Creation time (Unix seconds).
    pub created_at: u64,

    /// Ordered tags.
    pub tags: Vec<Tag>,

    /// Note body.
    pub content: String,

    /// Author public key (64 lowercase hex characters).
    pub pubkey: String,
}

impl UnsignedEvent {
    /// Compute the content hash of this draft.
    pub fn compute_id(&self) -> EventId {
        compute_event_id(self)
    }
}

/// An event as returned by the signer: the draft plus `id` and `sig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvent {
    /// Content hash (64 hex characters).
    pub id: String,

    /// Author public key (64 hex characters).
    pub pubkey: String,

    /// Creation time (Unix seconds).
    pub created_at: u64,

    /// Category tag.
    pub kind: Kind,

    /// Ordered tags.
    pub tags: Vec<Tag>,

    /// Note body.
    pub content: String,

    /// Signature over `id` (128 hex characters).
    pub sig: String,
}

impl SignedEvent {
    /// Attach an id and signature to a draft.
    pub fn from_unsigned(unsigned: UnsignedEvent, id: String, sig: String) -> Self {
        Self {
            id,
            pubkey: unsigned.pubkey,
            created_at: unsigned.created_at,
            kind: unsigned.kind,
            tags: unsigned.tags,
            content: unsigned.content,
            sig,
        }
    }

    /// Strip `id` and `sig`, recovering the draft form.
    pub fn to_unsigned(&self) -> UnsignedEvent {
        UnsignedEvent {
            kind: self.kind,
            created_at: self.created_at,
            tags: self.tags.clone(),
            content: self.content.clone(),
            pubkey: self.pubkey.clone(),
        }
    }

    /// Recompute the content hash from the event's own fields.
    pub fn compute_id(&self) -> EventId {
        compute_event_id(&self.to_unsigned())
    }

    /// The claimed id, decoded. Says nothing about whether it is correct.
    pub fn event_id(&self) -> Result<EventId, CoreError> {
        EventId::from_hex(&self.id)
    }

    /// Decode an event from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for draft events.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    pubkey: String,
    kind: Kind,
    created_at: u64,
    tags: Vec<Tag>,
    content: String,
}

impl EventBuilder {
    /// Start a draft for the given author.
    pub fn new(pubkey: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            kind: Kind::TEXT_NOTE,
            created_at: 0,
            tags: Vec::new(),
            content: String::new(),
        }
    }

    /// Set the kind.
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the creation time (Unix seconds).
    pub fn created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Append a tag.
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Replace all tags.
    pub fn tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Build the draft.
    pub fn build(self) -> UnsignedEvent {
        UnsignedEvent {
            kind: self.kind,
            created_at: self.created_at,
            tags: self.tags,
            content: self.content,
            pubkey: self.pubkey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PK: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn test_builder_defaults_to_text_note() {
        let event = EventBuilder::new(PK).content("hi").build();
        assert_eq!(event.kind, Kind::TEXT_NOTE);
        assert!(event.tags.is_empty());
        assert_eq!(event.pubkey, PK);
    }

    #[test]
    fn test_tag_accessors() {
        let tag = Tag::new("r", ["https://example.com"]);
        assert_eq!(tag.label(), Some("r"));
        assert_eq!(tag.value(), Some("https://example.com"));
        assert_eq!(Tag(vec![]).label(), None);
    }

    #[test]
    fn test_signed_event_wire_shape() {
        let unsigned = EventBuilder::new(PK)
            .created_at(1700000000)
            .tag(Tag::new("t", ["clip"]))
            .content("hello")
            .build();
        let signed = SignedEvent::from_unsigned(unsigned.clone(), "a".repeat(64), "b".repeat(128));

        let value = serde_json::to_value(&signed).unwrap();
        assert_eq!(value["kind"], 1);
        assert_eq!(value["tags"][0][0], "t");
        assert_eq!(value["created_at"], 1700000000u64);
        assert_eq!(signed.to_unsigned(), unsigned);
    }

    #[test]
    fn test_signed_event_from_json() {
        let unsigned = EventBuilder::new(PK).created_at(1).content("x").build();
        let id = unsigned.compute_id();
        let signed = SignedEvent::from_unsigned(unsigned, id.to_hex(), "b".repeat(128));
        let json = serde_json::to_string(&signed).unwrap();

        let decoded = SignedEvent::from_json(&json).unwrap();
        assert_eq!(decoded, signed);
        assert_eq!(decoded.event_id().unwrap(), id);

        assert!(matches!(
            SignedEvent::from_json("[\"EVENT\"]"),
            Err(CoreError::DecodingError(_))
        ));
    }
}
