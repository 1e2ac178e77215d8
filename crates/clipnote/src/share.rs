//! The share flow: from an annotated moment to a signed note on the relays.
//!
//! State lives in a [`ShareSession`] owned by the caller, one per moment being
//! edited. The [`ShareOrchestrator`] is stateless apart from its collaborators
//! and can serve any number of sessions concurrently.

use std::sync::Arc;

use clipnote_bridge::{SignerCapability, SignerInfo};
use clipnote_core::{verify_integrity, SignedEvent};
use clipnote_relay::{PublishReport, Publisher};
use clipnote_store::{now_millis, HistoryRecord, HistoryStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, ShareError};
use crate::moment::{timestamp_url, ClipMoment};
use crate::player::{capture_time, seek_clamped, VideoPlayer};

/// What the last signer check found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignerStatus {
    /// A check has completed, successfully or not.
    pub checked: bool,
    pub available: bool,
    pub name: Option<String>,
    pub methods: Vec<String>,
    /// Author key from the last fetch, for display only.
    pub pubkey: Option<String>,
}

impl SignerStatus {
    fn unavailable() -> Self {
        Self {
            checked: true,
            ..Self::default()
        }
    }

    fn from_info(info: &SignerInfo, pubkey: Option<String>) -> Self {
        Self {
            checked: true,
            available: true,
            name: Some(info.display_name().to_string()),
            methods: info.methods.clone(),
            pubkey,
        }
    }
}

/// Result of loading a saved moment into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryApply {
    /// The session now holds the saved moment.
    Applied,
    /// The record belongs to another video. Open `url`, then load `id` again.
    OtherVideo { id: String, url: String },
}

/// Per-moment share state.
#[derive(Debug, Clone)]
pub struct ShareSession {
    pub moment: ClipMoment,
    history_id: Option<String>,
    saved_at: Option<u64>,
    event_id: Option<String>,
    published_at: Option<u64>,
    signer: SignerStatus,
}

impl ShareSession {
    pub fn new(moment: ClipMoment) -> Self {
        Self {
            moment,
            history_id: None,
            saved_at: None,
            event_id: None,
            published_at: None,
            signer: SignerStatus::default(),
        }
    }

    /// Id of the history record this session saves into, once saved.
    pub fn history_id(&self) -> Option<&str> {
        self.history_id.as_deref()
    }

    pub fn saved_at(&self) -> Option<u64> {
        self.saved_at
    }

    /// Id of the last note published from this session.
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn published_at(&self) -> Option<u64> {
        self.published_at
    }

    pub fn signer_status(&self) -> &SignerStatus {
        &self.signer
    }

    /// Forget the last signer check.
    pub fn reset_signer(&mut self) {
        self.signer = SignerStatus::default();
    }

    /// Take the selected time from the player's current position.
    pub fn capture_time(&mut self, player: &dyn VideoPlayer) -> Option<u64> {
        let seconds = capture_time(player)?;
        self.moment.selected_time = seconds;
        Some(seconds)
    }

    /// Snapshot for the history store at `now` (Unix ms).
    ///
    /// A session that was never saved gets a fresh id; `saved_at` is kept
    /// from the first save.
    pub fn to_record(&self, now: u64) -> HistoryRecord {
        HistoryRecord {
            id: self
                .history_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            video_id: self.moment.video_id.clone(),
            title: self.moment.title.clone(),
            channel: self.moment.channel.clone(),
            timestamp: self.moment.selected_time,
            preview_image: self.moment.preview_or_default(),
            comment: self.moment.comment.clone(),
            saved_at: self.saved_at.unwrap_or(now),
            updated_at: now,
            event_id: self.event_id.clone(),
            published_at: self.published_at,
        }
    }

    /// Load a saved moment, seeking `player` to it.
    ///
    /// Blank title or channel in the record keep the session's own.
    pub fn apply_history_item(
        &mut self,
        record: &HistoryRecord,
        player: Option<&dyn VideoPlayer>,
    ) -> HistoryApply {
        if record.video_id != self.moment.video_id {
            return HistoryApply::OtherVideo {
                id: record.id.clone(),
                url: timestamp_url(&record.video_id, record.timestamp),
            };
        }

        self.history_id = Some(record.id.clone());
        if !record.title.is_empty() {
            self.moment.title = record.title.clone();
        }
        if !record.channel.is_empty() {
            self.moment.channel = record.channel.clone();
        }
        self.moment.selected_time = record.timestamp;
        self.moment.preview_image =
            Some(record.preview_image.clone()).filter(|p| !p.is_empty());
        self.moment.comment = record.comment.clone();
        self.saved_at = Some(record.saved_at);
        self.event_id = record.event_id.clone();
        self.published_at = record.published_at;

        if let Some(player) = player {
            seek_clamped(player, record.timestamp as f64);
        }
        HistoryApply::Applied
    }

    fn mark_saved(&mut self, record: &HistoryRecord) {
        self.history_id = Some(record.id.clone());
        self.saved_at = Some(record.saved_at);
    }
}

/// A successful share.
#[derive(Debug, Clone)]
pub struct ShareReport {
    /// The verified note as published.
    pub event: SignedEvent,
    pub publish: PublishReport,
}

impl ShareReport {
    pub fn accepted(&self) -> usize {
        self.publish.success_count()
    }

    /// Status line for the user.
    pub fn status(&self) -> String {
        let count = self.accepted();
        let noun = if count == 1 { "relay" } else { "relays" };
        format!("Shared to Nostr ({} {}).", count, noun)
    }
}

type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Runs the share flow against a signer, a publisher and a history store.
pub struct ShareOrchestrator {
    signer: Arc<dyn SignerCapability>,
    publisher: Publisher,
    history: Arc<dyn HistoryStore>,
    /// Unix ms.
    clock: Clock,
}

impl ShareOrchestrator {
    pub fn new(
        signer: Arc<dyn SignerCapability>,
        publisher: Publisher,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            signer,
            publisher,
            history,
            clock: Arc::new(now_millis),
        }
    }

    /// Replace the wall clock (Unix ms).
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────

    /// Save the session's moment into history.
    pub async fn save(&self, session: &mut ShareSession) -> Result<HistoryRecord> {
        let record = session.to_record((self.clock)());
        let stored = self.history.upsert(record).await?;
        session.mark_saved(&stored);
        debug!(id = %stored.id, video = %stored.video_id, "moment saved");
        Ok(stored)
    }

    /// Saved moments, newest first.
    pub async fn list_history(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.history.list().await?)
    }

    pub async fn delete_history(&self, id: &str) -> Result<()> {
        self.history.delete_by_id(id).await?;
        debug!(id = %id, "history record deleted");
        Ok(())
    }

    /// Load the saved moment `id` into `session`. `None` if it no longer
    /// exists.
    pub async fn load_history(
        &self,
        id: &str,
        session: &mut ShareSession,
        player: Option<&dyn VideoPlayer>,
    ) -> Result<Option<HistoryApply>> {
        let record = self.history.get(id).await?;
        Ok(record.map(|r| session.apply_history_item(&r, player)))
    }

    async fn save_quietly(&self, session: &mut ShareSession, stage: &str) {
        if let Err(e) = self.save(session).await {
            warn!(stage, error = %e, "could not persist moment, continuing");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signer
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask the signer who it is. Never fails: any error means unavailable.
    ///
    /// With `fetch_pubkey` the author key is fetched too and recorded in the
    /// session. A signer that is present but withholds its key is still
    /// available.
    pub async fn check_signer(
        &self,
        session: &mut ShareSession,
        fetch_pubkey: bool,
    ) -> SignerStatus {
        let status = match self.probe_signer(fetch_pubkey).await {
            Ok(status) => status,
            Err(e) => {
                debug!(error = %e, "signer check failed");
                SignerStatus::unavailable()
            }
        };
        session.signer = status.clone();
        status
    }

    async fn probe_signer(&self, fetch_pubkey: bool) -> Result<SignerStatus> {
        let info = self.signer.signer_info().await?;
        if !info.has_nostr {
            return Ok(SignerStatus::unavailable());
        }
        let pubkey = if fetch_pubkey {
            match self.signer.public_key().await {
                Ok(pubkey) => Some(pubkey),
                Err(e) => {
                    debug!(error = %e, "public key not available yet");
                    None
                }
            }
        } else {
            None
        };
        Ok(SignerStatus::from_info(&info, pubkey))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Share
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign the session's moment as a note and publish it.
    ///
    /// The draft is saved before anything else and again after a successful
    /// publish; neither save can fail the share.
    pub async fn share(&self, session: &mut ShareSession) -> Result<ShareReport> {
        self.save_quietly(session, "draft").await;

        let status = self.check_signer(session, false).await;
        if !status.available {
            return Err(ShareError::NoSigner);
        }

        // The account may have changed since the last check.
        let pubkey = self.signer.public_key().await?;
        session.signer.pubkey = Some(pubkey.clone());

        let created_at = (self.clock)() / 1000;
        let draft = session.moment.unsigned_event(&pubkey, created_at);
        let signed = self.signer.sign_event(&draft).await?;
        let event = verify_integrity(&draft, &signed, &pubkey)?;
        debug!(event_id = %event.id, "signed note verified");

        let relays = match self.signer.relay_preferences().await {
            Ok(preferences) => preferences.writable(),
            Err(e) => {
                debug!(error = %e, "relay preferences unavailable, using defaults");
                Vec::new()
            }
        };

        let publish = self.publisher.publish_to_many(&event, &relays).await;
        if !publish.is_success() {
            warn!(event_id = %event.id, attempted = publish.len(), "no relay accepted the note");
            return Err(ShareError::PublishFailed { report: publish });
        }

        session.event_id = Some(event.id.clone());
        session.published_at = Some((self.clock)());
        self.save_quietly(session, "published").await;

        info!(
            event_id = %event.id,
            accepted = publish.success_count(),
            "note shared"
        );
        Ok(ShareReport { event, publish })
    }
}
