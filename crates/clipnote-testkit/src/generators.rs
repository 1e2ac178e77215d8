//! Proptest generators for property-based testing.

use proptest::prelude::*;

use clipnote_core::{EventBuilder, Kind, Tag, UnsignedEvent};

/// Generate a random 64-character lowercase hex public key.
pub fn pubkey() -> impl Strategy<Value = String> {
    any::<[u8; 32]>().prop_map(hex::encode)
}

/// Generate a creation time in seconds.
pub fn created_at() -> impl Strategy<Value = u64> {
    0u64..=4_102_444_800
}

/// Generate an event kind, biased towards text notes.
pub fn kind() -> impl Strategy<Value = Kind> {
    prop_oneof![
        3 => Just(Kind::TEXT_NOTE),
        1 => (0u32..40_000).prop_map(Kind),
    ]
}

/// Text that exercises JSON escaping: quotes, backslashes, control
/// characters and non-ASCII.
pub fn content(max_len: usize) -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-zA-Z0-9 ]{1,8}",
        Just("\"".to_string()),
        Just("\\".to_string()),
        Just("\n".to_string()),
        Just("\t".to_string()),
        Just("\u{1}".to_string()),
        Just("/".to_string()),
        Just("café".to_string()),
        Just("🎬".to_string()),
    ];
    proptest::collection::vec(piece, 0..max_len.max(1)).prop_map(|parts| parts.concat())
}

/// Generate a single tag.
pub fn tag() -> impl Strategy<Value = Tag> {
    ("[a-z]{1,2}", proptest::collection::vec(content(4), 1..3))
        .prop_map(|(label, values)| Tag::new(&label, values))
}

/// Parameters for generating a draft event.
#[derive(Debug, Clone)]
pub struct EventParams {
    pub pubkey: String,
    pub created_at: u64,
    pub kind: Kind,
    pub tags: Vec<Tag>,
    pub content: String,
}

impl Arbitrary for EventParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            pubkey(),
            created_at(),
            kind(),
            proptest::collection::vec(tag(), 0..5),
            content(16),
        )
            .prop_map(|(pubkey, created_at, kind, tags, content)| EventParams {
                pubkey,
                created_at,
                kind,
                tags,
                content,
            })
            .boxed()
    }
}

/// Build a draft from generated parameters.
pub fn event_from_params(params: &EventParams) -> UnsignedEvent {
    EventBuilder::new(params.pubkey.clone())
        .kind(params.kind)
        .created_at(params.created_at)
        .tags(params.tags.clone())
        .content(params.content.clone())
        .build()
}

/// Generate a relay endpoint, valid or not.
pub fn relay_endpoint() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,10}\\.example".prop_map(|host| format!("wss://{}", host)),
        "[a-z]{1,10}\\.example".prop_map(|host| format!("  wss://{}/  ", host)),
        "[a-z]{1,10}\\.example".prop_map(|host| format!("ws://{}", host)),
        "[a-z]{1,10}\\.example".prop_map(|host| format!("https://{}", host)),
        Just(String::new()),
        Just("wss://".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipnote_core::canonical_bytes;

    proptest! {
        #[test]
        fn test_event_id_deterministic(params: EventParams) {
            let a = event_from_params(&params);
            let b = event_from_params(&params);
            prop_assert_eq!(a.compute_id(), b.compute_id());
        }

        #[test]
        fn test_canonical_form_is_valid_json(params: EventParams) {
            let event = event_from_params(&params);
            let parsed: serde_json::Value = serde_json::from_slice(&canonical_bytes(&event)).unwrap();
            prop_assert_eq!(parsed[5].as_str(), Some(event.content.as_str()));
            prop_assert_eq!(parsed[4].as_array().map(|t| t.len()), Some(event.tags.len()));
        }

        #[test]
        fn test_content_change_changes_id(params: EventParams, suffix in "[a-z]{1,4}") {
            let original = event_from_params(&params);
            let mut changed = original.clone();
            changed.content.push_str(&suffix);
            prop_assert_ne!(original.compute_id(), changed.compute_id());
        }
    }
}
