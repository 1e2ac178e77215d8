//! Golden test vectors for deterministic verification.
//!
//! Each vector pins the id of one draft. Any implementation that serializes
//! events differently (escaping, tag order, number formatting) fails here.

use clipnote_core::{canonical_bytes, EventBuilder, Kind, Tag, UnsignedEvent};

/// Public key shared by all vectors.
pub const VECTOR_PUBKEY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub created_at: u64,
    pub kind: u32,
    pub tags: &'static [&'static [&'static str]],
    pub content: &'static str,
    /// Expected event id (hex).
    pub expected_id: &'static str,
}

const CLIP_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s";
const CLIP_CONTENT: &str = "Great moment\n\nNever Gonna Give You Up\n\n\
https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s\n\nTimestamp: 00:42";

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "plain_text",
            created_at: 1_700_000_000,
            kind: 1,
            tags: &[],
            content: "hello",
            expected_id: "bde202ea7642ff9910600c7edc948a1f4220f0cbf5e4fb2b7efafa681bbb5285",
        },
        GoldenVector {
            name: "clip_note",
            created_at: 1_718_000_000,
            kind: 1,
            tags: &[&["r", CLIP_URL], &["t", "youtube"], &["t", "clip"]],
            content: CLIP_CONTENT,
            expected_id: "cf2abe837fda50567da26b1dee34d8586d13aa396b8db345b0863d01a44287cd",
        },
        GoldenVector {
            name: "clip_note_reordered_tags",
            created_at: 1_718_000_000,
            kind: 1,
            tags: &[&["t", "youtube"], &["r", CLIP_URL], &["t", "clip"]],
            content: CLIP_CONTENT,
            expected_id: "e572d5c975ca3b2ab2f35a73832d1f1662ffa331ec5d17ef4229e90297222ce9",
        },
        GoldenVector {
            name: "escapes",
            created_at: 1,
            kind: 1,
            tags: &[&["t", "a\"b"]],
            content: "quote \" backslash \\ tab \t ctrl \u{0001} slash / café 🎬",
            expected_id: "6763f85c8530242143bee310855a808868ce8e46b1475f416bc1a324d78bba2f",
        },
    ]
}

/// Build the draft a vector describes.
pub fn event_from_vector(vector: &GoldenVector) -> UnsignedEvent {
    let tags = vector
        .tags
        .iter()
        .map(|tag| Tag(tag.iter().map(|s| s.to_string()).collect()))
        .collect();

    EventBuilder::new(VECTOR_PUBKEY)
        .kind(Kind(vector.kind))
        .created_at(vector.created_at)
        .tags(tags)
        .content(vector.content)
        .build()
}

/// Recompute every vector: `(name, matches, computed id)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let hex = event_from_vector(v).compute_id().to_hex();
            (v.name.to_string(), hex == v.expected_id, hex)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, hex) in verify_all_vectors() {
            assert!(matches, "vector '{}' computed {}", name, hex);
        }
    }

    #[test]
    fn test_escapes_canonical_form() {
        let vector = all_vectors().into_iter().find(|v| v.name == "escapes").unwrap();
        let bytes = canonical_bytes(&event_from_vector(&vector));
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains(r#"quote \" backslash \\ tab \t ctrl \u0001 slash / café 🎬"#));
        assert!(text.contains(r#"[["t","a\"b"]]"#));
    }

    #[test]
    fn test_tag_order_changes_id() {
        let vectors = all_vectors();
        assert_ne!(vectors[1].expected_id, vectors[2].expected_id);
    }
}
