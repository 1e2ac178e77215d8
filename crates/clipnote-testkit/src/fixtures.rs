//! Test fixtures: a scriptable signer and the plumbing around it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clipnote_bridge::{
    BridgeChannel, BridgeClient, BridgeConfig, BridgeSession, InProcessLauncher, Signer,
    SignerError,
};
use clipnote_core::{SignedEvent, Tag, UnsignedEvent};
use clipnote_relay::transport::memory::MemoryRelayNetwork;
use clipnote_relay::{PublishConfig, Publisher};
use clipnote_store::HistoryRecord;
use serde_json::{json, Value};

/// Public key the test signer signs with.
pub const TEST_PUBKEY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

/// Placeholder signature: well-formed hex, never checked cryptographically.
pub const TEST_SIGNATURE: &str = "5ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea1\
5ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea15ea1";

/// How the signer misbehaves when signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TamperMode {
    /// Sign honestly.
    #[default]
    None,
    /// Append to the content, recomputing the id.
    ChangeContent,
    /// Shift `created_at` by one second, recomputing the id.
    ChangeCreatedAt,
    /// Reverse the tag list, recomputing the id.
    ReorderTags,
    /// Sign with a different key.
    WrongPubkey,
    /// Keep the payload but return an id that does not match it.
    BadId,
    /// Return a JSON string instead of an object.
    NotAnObject,
    /// Omit the signature.
    MissingSignature,
}

/// A [`Signer`] with a switchable key and scriptable behaviour.
pub struct TestSigner {
    pubkey: Mutex<String>,
    name: Option<String>,
    tamper: TamperMode,
    relays: Value,
    relays_error: Option<String>,
    rejection: Option<String>,
    methods: Option<Vec<String>>,
    sign_calls: AtomicUsize,
    signed: Mutex<Vec<Value>>,
}

impl TestSigner {
    pub fn new() -> Self {
        Self {
            pubkey: Mutex::new(TEST_PUBKEY.to_string()),
            name: Some("Test Signer".to_string()),
            tamper: TamperMode::None,
            relays: json!({}),
            relays_error: None,
            rejection: None,
            methods: None,
            sign_calls: AtomicUsize::new(0),
            signed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tamper(mut self, tamper: TamperMode) -> Self {
        self.tamper = tamper;
        self
    }

    /// Relay preferences returned by `getRelays`.
    pub fn with_relays(mut self, relays: Value) -> Self {
        self.relays = relays;
        self
    }

    /// Make `getRelays` fail.
    pub fn failing_relays(mut self, message: &str) -> Self {
        self.relays_error = Some(message.to_string());
        self
    }

    /// Reject every signing request, as a user declining would.
    pub fn rejecting(mut self, message: &str) -> Self {
        self.rejection = Some(message.to_string());
        self
    }

    /// Advertise only these methods.
    pub fn with_methods(mut self, methods: &[&str]) -> Self {
        self.methods = Some(methods.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn unnamed(mut self) -> Self {
        self.name = None;
        self
    }

    pub fn pubkey(&self) -> String {
        self.pubkey.lock().map(|k| k.clone()).unwrap_or_default()
    }

    /// Switch to another account mid-session.
    pub fn switch_account(&self, pubkey: &str) {
        if let Ok(mut current) = self.pubkey.lock() {
            *current = pubkey.to_string();
        }
    }

    /// Number of `signEvent` calls received.
    pub fn sign_count(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// Every signed payload returned so far.
    pub fn signed(&self) -> Vec<Value> {
        self.signed.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn sign(&self, mut draft: UnsignedEvent) -> Value {
        match self.tamper {
            TamperMode::ChangeContent => draft.content.push_str(" (edited)"),
            TamperMode::ChangeCreatedAt => draft.created_at += 1,
            TamperMode::ReorderTags => draft.tags.reverse(),
            TamperMode::WrongPubkey => draft.pubkey = "f".repeat(64),
            TamperMode::NotAnObject => return json!("signed"),
            _ => {}
        }

        let id = match self.tamper {
            TamperMode::BadId => "0".repeat(64),
            _ => draft.compute_id().to_hex(),
        };
        let signed = SignedEvent::from_unsigned(draft, id, TEST_SIGNATURE.to_string());
        let mut value = serde_json::to_value(signed).unwrap_or(Value::Null);
        if self.tamper == TamperMode::MissingSignature {
            if let Some(object) = value.as_object_mut() {
                object.remove("sig");
            }
        }
        value
    }
}

impl Default for TestSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Signer for TestSigner {
    fn name_hints(&self) -> Vec<String> {
        self.name.iter().cloned().collect()
    }

    fn methods(&self) -> Vec<String> {
        match &self.methods {
            Some(methods) => methods.clone(),
            None => vec!["getPublicKey".into(), "signEvent".into(), "getRelays".into()],
        }
    }

    async fn get_public_key(&self) -> Result<Value, SignerError> {
        Ok(Value::String(self.pubkey()))
    }

    async fn sign_event(&self, event: Value) -> Result<Value, SignerError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.rejection {
            return Err(SignerError::new(message.clone()));
        }
        let mut draft: UnsignedEvent = serde_json::from_value(event)
            .map_err(|e| SignerError::new(format!("bad draft: {}", e)))?;
        draft.pubkey = self.pubkey();

        let signed = self.sign(draft);
        if let Ok(mut log) = self.signed.lock() {
            log.push(signed.clone());
        }
        Ok(signed)
    }

    async fn get_relays(&self) -> Result<Value, SignerError> {
        match &self.relays_error {
            Some(message) => Err(SignerError::new(message.clone())),
            None => Ok(self.relays.clone()),
        }
    }
}

/// A bridge client whose far side runs `signer` in-process.
pub fn bridged_client(signer: Arc<dyn Signer>, config: BridgeConfig) -> BridgeClient {
    let launcher = Arc::new(InProcessLauncher::new(signer));
    let session = BridgeSession::new(BridgeChannel::default(), launcher, config);
    BridgeClient::new(Arc::new(session))
}

/// A publisher over scripted relays.
pub fn publisher(network: &MemoryRelayNetwork, config: PublishConfig) -> Publisher {
    Publisher::new(Arc::new(network.clone()), config)
}

/// A signed event for `content`, with a valid id.
pub fn signed_note(content: &str, created_at: u64) -> SignedEvent {
    let draft = clipnote_core::EventBuilder::new(TEST_PUBKEY)
        .created_at(created_at)
        .tag(Tag::new("t", ["test"]))
        .content(content)
        .build();
    let id = draft.compute_id().to_hex();
    SignedEvent::from_unsigned(draft, id, TEST_SIGNATURE.to_string())
}

/// A saved moment with no publish recorded.
pub fn history_record(id: &str, video_id: &str, timestamp: u64) -> HistoryRecord {
    HistoryRecord {
        id: id.to_string(),
        video_id: video_id.to_string(),
        title: format!("Video {}", video_id),
        channel: "Test Channel".to_string(),
        timestamp,
        preview_image: format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", video_id),
        comment: String::new(),
        saved_at: 1_718_000_000_000,
        updated_at: 1_718_000_000_000,
        event_id: None,
        published_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipnote_bridge::SignerCapability;
    use clipnote_core::{verify_integrity, EventBuilder, IntegrityError};

    fn draft() -> UnsignedEvent {
        EventBuilder::new(TEST_PUBKEY)
            .created_at(1_718_000_000)
            .tag(Tag::new("r", ["https://example.com"]))
            .tag(Tag::new("t", ["clip"]))
            .content("hi")
            .build()
    }

    async fn sign_with(tamper: TamperMode) -> Result<SignedEvent, IntegrityError> {
        let signer = TestSigner::new().with_tamper(tamper);
        let value = signer
            .sign_event(serde_json::to_value(draft()).unwrap())
            .await
            .unwrap();
        verify_integrity(&draft(), &value, TEST_PUBKEY)
    }

    #[test]
    fn test_signature_shape() {
        assert_eq!(TEST_SIGNATURE.len(), 128);
        assert!(clipnote_core::is_hex(TEST_SIGNATURE, 128));
    }

    #[tokio::test]
    async fn test_honest_signer_passes_integrity() {
        let event = sign_with(TamperMode::None).await.unwrap();
        assert_eq!(event.id, draft().compute_id().to_hex());
    }

    #[tokio::test]
    async fn test_each_tamper_mode_is_caught() {
        let cases = [
            (TamperMode::ChangeContent, IntegrityError::PayloadChanged),
            (TamperMode::ChangeCreatedAt, IntegrityError::TimestampChanged),
            (TamperMode::ReorderTags, IntegrityError::TagsChanged),
            (TamperMode::WrongPubkey, IntegrityError::PubkeyMismatch),
            (TamperMode::NotAnObject, IntegrityError::NotAnObject),
            (TamperMode::MissingSignature, IntegrityError::Malformed),
        ];
        for (tamper, expected) in cases {
            assert_eq!(sign_with(tamper).await.unwrap_err(), expected, "{:?}", tamper);
        }
        assert!(matches!(
            sign_with(TamperMode::BadId).await,
            Err(IntegrityError::IdMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_bridged_client_reaches_signer() {
        let signer = Arc::new(TestSigner::new().with_relays(json!({"wss://r.example": {}})));
        let client = bridged_client(signer.clone(), BridgeConfig::default());

        assert_eq!(client.public_key().await.unwrap(), TEST_PUBKEY);
        assert_eq!(client.signer_info().await.unwrap().display_name(), "Test Signer");
        assert_eq!(client.relay_preferences().await.unwrap().writable(), vec!["wss://r.example"]);

        client.sign_event(&draft()).await.unwrap();
        assert_eq!(signer.sign_count(), 1);
    }

    #[tokio::test]
    async fn test_rejecting_signer_reports_its_message() {
        let client = bridged_client(
            Arc::new(TestSigner::new().rejecting("User rejected")),
            BridgeConfig::default(),
        );
        let err = client.sign_event(&draft()).await.unwrap_err();
        assert_eq!(err.to_string(), "User rejected");
    }
}
