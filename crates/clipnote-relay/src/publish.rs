//! Publishing a signed event to many relays at once.
//!
//! Each relay gets one connection and one attempt, raced against a hard
//! timeout. All attempts run concurrently and the report is assembled only
//! after every one of them has settled.

use std::sync::Arc;
use std::time::Duration;

use clipnote_core::SignedEvent;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use crate::endpoint::{normalize_relays, RelayUrl};
use crate::messages::{ClientMessage, RelayMessage};
use crate::transport::{RelayConnection, RelayConnector};

/// Reason given for an endpoint that failed validation.
pub const REASON_INVALID_URL: &str = "invalid relay URL";
/// Reason given for any transport failure.
pub const REASON_SOCKET_ERROR: &str = "socket error";
/// Reason given when no verdict arrived in time.
pub const REASON_TIMEOUT: &str = "timeout";
/// Detail given when the relay closed without acknowledging.
pub const DETAIL_NO_ACK: &str = "sent (no ack)";

/// Well-known relays used when the caller supplies none.
pub const DEFAULT_RELAYS: [&str; 3] = [
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.primal.net",
];

/// Configuration for publishing.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Per-relay bound on connect + send + acknowledgment.
    pub ack_timeout: Duration,
    /// Bound on the closing handshake once a verdict is in.
    pub close_timeout: Duration,
    /// Maximum number of relays attempted per publish.
    pub max_relays: usize,
    /// Substituted when the caller supplies no relays.
    pub default_relays: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(5500),
            close_timeout: Duration::from_secs(1),
            max_relays: 6,
            default_relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// What a relay said, or why it said nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishDetail {
    /// The relay's own reason, possibly empty, or [`DETAIL_NO_ACK`].
    #[serde(rename = "message")]
    Ack(String),
    /// Why the attempt failed.
    Error(String),
}

/// Result of publishing to one relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub relay: String,
    pub ok: bool,
    #[serde(flatten)]
    pub detail: PublishDetail,
}

impl PublishOutcome {
    fn acked(relay: &str, ok: bool, message: String) -> Self {
        Self {
            relay: relay.to_string(),
            ok,
            detail: PublishDetail::Ack(message),
        }
    }

    fn failed(relay: &str, reason: &str) -> Self {
        Self {
            relay: relay.to_string(),
            ok: false,
            detail: PublishDetail::Error(reason.to_string()),
        }
    }

    /// The failure reason, if this attempt failed at the transport level.
    pub fn error(&self) -> Option<&str> {
        match &self.detail {
            PublishDetail::Error(reason) => Some(reason),
            PublishDetail::Ack(_) => None,
        }
    }
}

/// Per-relay outcomes, in the order the relays were attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub outcomes: Vec<PublishOutcome>,
}

impl PublishReport {
    /// Number of relays that accepted the event.
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.ok).count()
    }

    /// At least one relay accepted the event.
    pub fn is_success(&self) -> bool {
        self.success_count() > 0
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Publishes events through a [`RelayConnector`].
#[derive(Clone)]
pub struct Publisher {
    connector: Arc<dyn RelayConnector>,
    config: PublishConfig,
}

impl Publisher {
    pub fn new(connector: Arc<dyn RelayConnector>, config: PublishConfig) -> Self {
        Self { connector, config }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Publish to a single endpoint.
    ///
    /// An invalid endpoint fails immediately without a connection attempt.
    pub async fn publish_to_one(&self, relay: &str, event: &SignedEvent) -> PublishOutcome {
        match RelayUrl::parse(relay) {
            Ok(url) => self.publish_to_url(&url, event).await,
            Err(_) => {
                debug!(relay = %relay.trim(), "relay URL rejected");
                PublishOutcome::failed(relay, REASON_INVALID_URL)
            }
        }
    }

    /// Publish to many endpoints concurrently.
    ///
    /// An empty list means the configured defaults. The list is validated,
    /// deduplicated and capped before anything is attempted; invalid entries
    /// are dropped.
    pub async fn publish_to_many<S: AsRef<str>>(
        &self,
        event: &SignedEvent,
        relays: &[S],
    ) -> PublishReport {
        let targets = if relays.is_empty() {
            normalize_relays(&self.config.default_relays, self.config.max_relays)
        } else {
            normalize_relays(relays, self.config.max_relays)
        };

        debug!(
            event_id = %event.id,
            relays = targets.len(),
            "publishing event"
        );

        let outcomes = join_all(targets.iter().map(|url| self.publish_to_url(url, event))).await;
        let report = PublishReport { outcomes };
        info!(
            event_id = %event.id,
            attempted = report.len(),
            accepted = report.success_count(),
            "publish settled"
        );
        report
    }

    async fn publish_to_url(&self, url: &RelayUrl, event: &SignedEvent) -> PublishOutcome {
        let mut slot: Option<Box<dyn RelayConnection>> = None;
        let outcome = match tokio::time::timeout(
            self.config.ack_timeout,
            self.exchange(url, event, &mut slot),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => PublishOutcome::failed(url.as_str(), REASON_TIMEOUT),
        };

        if let Some(mut connection) = slot.take() {
            if tokio::time::timeout(self.config.close_timeout, connection.close())
                .await
                .is_err()
            {
                debug!(relay = %url, "close handshake stalled, dropping connection");
            }
        }

        debug!(relay = %url, ok = outcome.ok, detail = ?outcome.detail, "relay settled");
        outcome
    }

    /// Connect, send, and wait for this event's verdict.
    ///
    /// The connection is parked in `slot` so it can be closed even when the
    /// exchange is cut off by the timeout.
    async fn exchange(
        &self,
        url: &RelayUrl,
        event: &SignedEvent,
        slot: &mut Option<Box<dyn RelayConnection>>,
    ) -> PublishOutcome {
        let relay = url.as_str();
        let frame = match ClientMessage::Event(event).to_json() {
            Ok(frame) => frame,
            Err(_) => return PublishOutcome::failed(relay, REASON_SOCKET_ERROR),
        };

        let connection = match self.connector.connect(url).await {
            Ok(connection) => slot.insert(connection),
            Err(e) => {
                debug!(relay = %url, error = %e, "relay connect failed");
                return PublishOutcome::failed(relay, REASON_SOCKET_ERROR);
            }
        };

        if let Err(e) = connection.send(frame).await {
            debug!(relay = %url, error = %e, "relay send failed");
            return PublishOutcome::failed(relay, REASON_SOCKET_ERROR);
        }

        loop {
            match connection.recv().await {
                Some(Ok(text)) => match RelayMessage::parse(&text) {
                    Some(RelayMessage::Ok {
                        event_id,
                        accepted,
                        message,
                    }) if event_id == event.id => {
                        return PublishOutcome::acked(relay, accepted, message);
                    }
                    _ => continue,
                },
                Some(Err(e)) => {
                    debug!(relay = %url, error = %e, "relay socket error");
                    return PublishOutcome::failed(relay, REASON_SOCKET_ERROR);
                }
                None => return PublishOutcome::acked(relay, true, DETAIL_NO_ACK.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::{MemoryRelayNetwork, RelayBehaviour};
    use clipnote_core::{compute_event_id, EventBuilder};

    fn event() -> SignedEvent {
        let unsigned = EventBuilder::new("ab".repeat(32))
            .created_at(1718000000)
            .content("clip")
            .build();
        let id = compute_event_id(&unsigned).to_hex();
        SignedEvent::from_unsigned(unsigned, id, "cd".repeat(64))
    }

    fn publisher(network: &MemoryRelayNetwork) -> Publisher {
        Publisher::new(Arc::new(network.clone()), PublishConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_outcomes_aggregate_to_success() {
        let network = MemoryRelayNetwork::new()
            .with_relay("wss://slow.example", RelayBehaviour::Silent)
            .with_relay("wss://picky.example", RelayBehaviour::reject("blocked: no clips"))
            .with_relay("wss://good.example", RelayBehaviour::accept());

        let report = publisher(&network)
            .publish_to_many(
                &event(),
                &["wss://slow.example", "wss://picky.example", "wss://good.example"],
            )
            .await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.success_count(), 1);
        assert!(report.is_success());

        assert_eq!(report.outcomes[0].relay, "wss://slow.example");
        assert_eq!(report.outcomes[0].error(), Some(REASON_TIMEOUT));
        assert_eq!(
            report.outcomes[1].detail,
            PublishDetail::Ack("blocked: no clips".into())
        );
        assert!(!report.outcomes[1].ok);
        assert!(report.outcomes[2].ok);

        // Every opened connection was closed, the timed-out one included.
        assert_eq!(network.connect_count(), 3);
        assert_eq!(network.close_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_close_does_not_hold_the_report() {
        let network = MemoryRelayNetwork::new()
            .with_relay("wss://sticky.example", RelayBehaviour::StallOnClose)
            .with_relay("wss://good.example", RelayBehaviour::accept());
        let started = tokio::time::Instant::now();

        let report = publisher(&network)
            .publish_to_many(&event(), &["wss://sticky.example", "wss://good.example"])
            .await;

        assert_eq!(report.success_count(), 2);
        assert_eq!(network.close_count(), 2);
        let config = PublishConfig::default();
        assert!(started.elapsed() <= config.ack_timeout + config.close_timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failing_is_not_success() {
        let network = MemoryRelayNetwork::new()
            .with_relay("wss://a.example", RelayBehaviour::Silent)
            .with_relay("wss://b.example", RelayBehaviour::SocketError)
            .with_relay("wss://c.example", RelayBehaviour::Refuse);

        let report = publisher(&network)
            .publish_to_many(&event(), &["wss://a.example", "wss://b.example", "wss://c.example"])
            .await;

        assert_eq!(report.len(), 3);
        assert!(!report.is_success());
        assert_eq!(report.outcomes[0].error(), Some(REASON_TIMEOUT));
        assert_eq!(report.outcomes[1].error(), Some(REASON_SOCKET_ERROR));
        assert_eq!(report.outcomes[2].error(), Some(REASON_SOCKET_ERROR));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_never_connects() {
        let network = MemoryRelayNetwork::new();
        let outcome = publisher(&network)
            .publish_to_one("ws://insecure.example", &event())
            .await;

        assert!(!outcome.ok);
        assert_eq!(outcome.error(), Some(REASON_INVALID_URL));
        assert_eq!(network.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_clean_close_counts_as_sent() {
        let network = MemoryRelayNetwork::new()
            .with_relay("wss://quiet.example", RelayBehaviour::CloseWithoutAck);
        let outcome = publisher(&network)
            .publish_to_one("wss://quiet.example", &event())
            .await;

        assert!(outcome.ok);
        assert_eq!(outcome.detail, PublishDetail::Ack(DETAIL_NO_ACK.into()));
    }

    #[tokio::test]
    async fn test_unrelated_frames_skipped() {
        let network = MemoryRelayNetwork::new().with_relay(
            "wss://chatty.example",
            RelayBehaviour::NoticeThenAck {
                accepted: true,
                message: "duplicate: already have it".into(),
            },
        );
        let outcome = publisher(&network)
            .publish_to_one("wss://chatty.example", &event())
            .await;

        assert!(outcome.ok);
        assert_eq!(
            outcome.detail,
            PublishDetail::Ack("duplicate: already have it".into())
        );
    }

    #[tokio::test]
    async fn test_fan_out_capped_at_six() {
        let network = MemoryRelayNetwork::new();
        let relays: Vec<String> = (0..9).map(|i| format!("wss://r{i}.example")).collect();
        let mut with_duplicates = relays.clone();
        with_duplicates.insert(1, relays[0].clone());

        let report = publisher(&network).publish_to_many(&event(), &with_duplicates).await;

        assert_eq!(report.len(), 6);
        assert_eq!(network.connect_count(), 6);
        let attempted: Vec<&str> = report.outcomes.iter().map(|o| o.relay.as_str()).collect();
        assert_eq!(attempted, relays[..6].iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_empty_list_uses_defaults() {
        let network = MemoryRelayNetwork::new();
        let none: [&str; 0] = [];
        let report = publisher(&network).publish_to_many(&event(), &none).await;

        let attempted: Vec<&str> = report.outcomes.iter().map(|o| o.relay.as_str()).collect();
        assert_eq!(attempted, DEFAULT_RELAYS.to_vec());
        assert_eq!(report.success_count(), 3);
    }

    #[tokio::test]
    async fn test_event_frame_reaches_relay() {
        let network = MemoryRelayNetwork::new();
        let event = event();
        publisher(&network).publish_to_one("wss://a.example", &event).await;

        let received = network.received();
        assert_eq!(received.len(), 1);
        let frame: serde_json::Value = serde_json::from_str(&received[0].1).unwrap();
        assert_eq!(frame[0], "EVENT");
        assert_eq!(frame[1]["id"], event.id);
    }

    #[test]
    fn test_outcome_wire_shape() {
        let ok = serde_json::to_value(PublishOutcome::acked("wss://a", true, String::new())).unwrap();
        assert_eq!(ok, serde_json::json!({"relay": "wss://a", "ok": true, "message": ""}));
        let failed = serde_json::to_value(PublishOutcome::failed("wss://a", REASON_TIMEOUT)).unwrap();
        assert_eq!(failed, serde_json::json!({"relay": "wss://a", "ok": false, "error": "timeout"}));
    }
}
