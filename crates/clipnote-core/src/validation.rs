//! Integrity verification of signer output.
//!
//! The signer is reachable only through an isolation boundary and is not
//! trusted. Before a signed event may be published it must match the draft
//! that was handed to the signer field by field, and its `id` must be the
//! content hash of its own fields.
//!
//! Signature validity is not checked here. That is the signer's
//! responsibility and relays verify it again on ingest.

use serde_json::Value;

use crate::canonical::canonical_tags;
use crate::crypto::{compute_event_id, is_hex};
use crate::error::IntegrityError;
use crate::event::{SignedEvent, UnsignedEvent};
use crate::types::{EVENT_ID_HEX_LEN, PUBKEY_HEX_LEN, SIGNATURE_HEX_LEN};

/// Verify a raw signer response against its draft.
///
/// This performs:
/// - Shape check (must be a JSON object with well-formed hex fields)
/// - All checks of [`verify_signed_event`]
pub fn verify_integrity(
    unsigned: &UnsignedEvent,
    signed: &Value,
    expected_pubkey: &str,
) -> Result<SignedEvent, IntegrityError> {
    let object = signed.as_object().ok_or(IntegrityError::NotAnObject)?;

    // Hex fields first, so a garbage payload reports as malformed rather
    // than as a decoding failure of some unrelated field.
    for (field, len) in [
        ("pubkey", PUBKEY_HEX_LEN),
        ("id", EVENT_ID_HEX_LEN),
        ("sig", SIGNATURE_HEX_LEN),
    ] {
        match object.get(field).and_then(Value::as_str) {
            Some(value) if is_hex(value, len) => {}
            _ => return Err(IntegrityError::Malformed),
        }
    }

    let event: SignedEvent =
        serde_json::from_value(signed.clone()).map_err(|_| IntegrityError::Malformed)?;

    verify_signed_event(unsigned, &event, expected_pubkey)?;
    Ok(event)
}

/// Verify a decoded signed event against its draft.
///
/// This performs:
/// - Hex length checks on `pubkey`, `id` and `sig`
/// - Author check against both the expected key and the draft
/// - Payload checks (`kind`, `content`, `created_at`, serialized `tags`)
/// - Content hash check (`id` must equal the recomputed hash)
pub fn verify_signed_event(
    unsigned: &UnsignedEvent,
    signed: &SignedEvent,
    expected_pubkey: &str,
) -> Result<(), IntegrityError> {
    // 1. Field shapes
    if !is_hex(&signed.pubkey, PUBKEY_HEX_LEN)
        || !is_hex(&signed.id, EVENT_ID_HEX_LEN)
        || !is_hex(&signed.sig, SIGNATURE_HEX_LEN)
    {
        return Err(IntegrityError::Malformed);
    }

    // 2. Author
    if signed.pubkey != expected_pubkey || signed.pubkey != unsigned.pubkey {
        return Err(IntegrityError::PubkeyMismatch);
    }

    // 3. Payload
    if signed.kind != unsigned.kind || signed.content != unsigned.content {
        return Err(IntegrityError::PayloadChanged);
    }
    if signed.created_at != unsigned.created_at {
        return Err(IntegrityError::TimestampChanged);
    }
    if canonical_tags(&signed.tags) != canonical_tags(&unsigned.tags) {
        return Err(IntegrityError::TagsChanged);
    }

    // 4. Content hash
    let expected = compute_event_id(&signed.to_unsigned()).to_hex();
    if expected != signed.id {
        return Err(IntegrityError::IdMismatch {
            expected,
            actual: signed.id.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventBuilder, Kind, Tag};
    use proptest::prelude::*;
    use serde_json::json;

    const PK: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const OTHER_PK: &str = "c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5";

    fn make_draft() -> UnsignedEvent {
        EventBuilder::new(PK)
            .created_at(1718000000)
            .tag(Tag::new("r", ["https://www.youtube.com/watch?v=abc&t=42s"]))
            .tag(Tag::new("t", ["youtube"]))
            .tag(Tag::new("t", ["clip"]))
            .content("nice moment")
            .build()
    }

    /// Sign honestly: correct id, placeholder signature of the right length.
    fn sign(unsigned: &UnsignedEvent) -> SignedEvent {
        let id = compute_event_id(unsigned).to_hex();
        SignedEvent::from_unsigned(unsigned.clone(), id, "5a".repeat(64))
    }

    /// Re-sign a tampered event so its id is self-consistent.
    fn resign(mut event: SignedEvent) -> SignedEvent {
        event.id = event.compute_id().to_hex();
        event
    }

    #[test]
    fn test_valid_event_passes() {
        let draft = make_draft();
        let signed = sign(&draft);
        let value = serde_json::to_value(&signed).unwrap();
        let verified = verify_integrity(&draft, &value, PK).unwrap();
        assert_eq!(verified, signed);
    }

    #[test]
    fn test_non_object_rejected() {
        let draft = make_draft();
        for value in [json!(null), json!("event"), json!([1, 2]), json!(42)] {
            assert_eq!(
                verify_integrity(&draft, &value, PK),
                Err(IntegrityError::NotAnObject)
            );
        }
    }

    #[test]
    fn test_malformed_hex_fields_rejected() {
        let draft = make_draft();
        let signed = sign(&draft);

        let mut short_sig = serde_json::to_value(&signed).unwrap();
        short_sig["sig"] = json!("ab".repeat(32));
        assert_eq!(
            verify_integrity(&draft, &short_sig, PK),
            Err(IntegrityError::Malformed)
        );

        let mut bad_id = serde_json::to_value(&signed).unwrap();
        bad_id["id"] = json!("zz".repeat(32));
        assert_eq!(
            verify_integrity(&draft, &bad_id, PK),
            Err(IntegrityError::Malformed)
        );

        let mut missing_pubkey = serde_json::to_value(&signed).unwrap();
        missing_pubkey.as_object_mut().unwrap().remove("pubkey");
        assert_eq!(
            verify_integrity(&draft, &missing_pubkey, PK),
            Err(IntegrityError::Malformed)
        );
    }

    #[test]
    fn test_undecodable_fields_rejected() {
        let draft = make_draft();
        let mut value = serde_json::to_value(sign(&draft)).unwrap();
        value["tags"] = json!("not a list");
        assert_eq!(
            verify_integrity(&draft, &value, PK),
            Err(IntegrityError::Malformed)
        );
    }

    #[test]
    fn test_pubkey_swap_rejected() {
        let draft = make_draft();
        let mut signed = sign(&draft);
        signed.pubkey = OTHER_PK.to_string();
        let signed = resign(signed);
        assert_eq!(
            verify_signed_event(&draft, &signed, PK),
            Err(IntegrityError::PubkeyMismatch)
        );
        // Signer agreeing with itself is not enough: expected key must match too.
        assert_eq!(
            verify_signed_event(&draft, &sign(&draft), OTHER_PK),
            Err(IntegrityError::PubkeyMismatch)
        );
    }

    #[test]
    fn test_payload_changes_rejected() {
        let draft = make_draft();

        let mut content = sign(&draft);
        content.content = "buy my coin".into();
        assert_eq!(
            verify_signed_event(&draft, &resign(content), PK),
            Err(IntegrityError::PayloadChanged)
        );

        let mut kind = sign(&draft);
        kind.kind = Kind(4);
        assert_eq!(
            verify_signed_event(&draft, &resign(kind), PK),
            Err(IntegrityError::PayloadChanged)
        );

        let mut time = sign(&draft);
        time.created_at += 1;
        assert_eq!(
            verify_signed_event(&draft, &resign(time), PK),
            Err(IntegrityError::TimestampChanged)
        );
    }

    #[test]
    fn test_tag_reorder_rejected() {
        let draft = make_draft();
        let mut signed = sign(&draft);
        signed.tags.swap(0, 1);
        assert_eq!(
            verify_signed_event(&draft, &resign(signed), PK),
            Err(IntegrityError::TagsChanged)
        );
    }

    #[test]
    fn test_wrong_id_rejected() {
        let draft = make_draft();
        let mut signed = sign(&draft);
        signed.id = "ab".repeat(32);
        assert!(matches!(
            verify_signed_event(&draft, &signed, PK),
            Err(IntegrityError::IdMismatch { .. })
        ));
    }

    #[test]
    fn test_uppercase_id_rejected() {
        let draft = make_draft();
        let mut signed = sign(&draft);
        signed.id = signed.id.to_uppercase();
        assert!(matches!(
            verify_signed_event(&draft, &signed, PK),
            Err(IntegrityError::IdMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn any_content_change_is_detected(original in ".{0,40}", altered in ".{0,40}") {
            prop_assume!(original != altered);
            let draft = EventBuilder::new(PK).created_at(1).content(original).build();
            let mut signed = sign(&draft);
            signed.content = altered;
            let signed = resign(signed);
            prop_assert_eq!(
                verify_signed_event(&draft, &signed, PK),
                Err(IntegrityError::PayloadChanged)
            );
        }

        #[test]
        fn honest_signatures_always_pass(content in ".{0,80}", created_at in 0u64..4_000_000_000) {
            let draft = EventBuilder::new(PK).created_at(created_at).content(content).build();
            prop_assert!(verify_signed_event(&draft, &sign(&draft), PK).is_ok());
        }
    }
}
