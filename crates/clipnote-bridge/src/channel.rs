//! The shared broadcast channel connecting the two sides of the bridge.
//!
//! Models a page-wide message bus: every subscriber receives every posted
//! message, including its own, and messages from unrelated scripts. Receivers
//! filter by `source`, `type` and token.

use serde_json::Value;
use tokio::sync::broadcast;

/// Default number of buffered messages per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Handle to the shared channel. Cheap to clone; all clones post to and
/// subscribe from the same bus.
#[derive(Debug, Clone)]
pub struct BridgeChannel {
    tx: broadcast::Sender<Value>,
}

impl BridgeChannel {
    /// Create a new channel.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Post a message to every current subscriber.
    ///
    /// Posting with nobody listening is not an error, same as a page bus.
    pub fn post(&self, message: Value) {
        let _ = self.tx.send(message);
    }

    /// Subscribe to all messages posted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BridgeChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receive the next message, skipping over lag gaps.
///
/// Returns `None` once every sender is gone.
pub async fn next_message(rx: &mut broadcast::Receiver<Value>) -> Option<Value> {
    loop {
        match rx.recv().await {
            Ok(value) => return Some(value),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "bridge subscriber lagged, messages dropped");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_every_subscriber_sees_every_message() {
        let channel = BridgeChannel::default();
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();

        channel.post(json!({"n": 1}));

        assert_eq!(next_message(&mut a).await, Some(json!({"n": 1})));
        assert_eq!(next_message(&mut b).await, Some(json!({"n": 1})));
        assert_eq!(channel.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_post_without_subscribers() {
        let channel = BridgeChannel::default();
        channel.post(json!("nobody home"));
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_channel_ends_stream() {
        let channel = BridgeChannel::new(4);
        let mut rx = channel.subscribe();
        drop(channel);
        assert_eq!(next_message(&mut rx).await, None);
    }
}
