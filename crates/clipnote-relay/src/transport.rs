//! Transport abstraction for relay connections.
//!
//! A [`RelayConnector`] opens one [`RelayConnection`] per endpoint. The
//! publisher only needs text frames in both directions and a close.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::trace;

use crate::endpoint::RelayUrl;
use crate::error::{RelayError, Result};

/// Opens connections to relays.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    /// Connect to a relay.
    async fn connect(&self, url: &RelayUrl) -> Result<Box<dyn RelayConnection>>;
}

/// One open relay connection.
#[async_trait]
pub trait RelayConnection: Send {
    /// Send a text frame.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Receive the next text frame.
    ///
    /// Returns `None` once the relay has closed the connection cleanly.
    async fn recv(&mut self) -> Option<Result<String>>;

    /// Close the connection. Closing twice is harmless.
    async fn close(&mut self);
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Real websocket connections (TLS via rustls).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl RelayConnector for WsConnector {
    async fn connect(&self, url: &RelayUrl) -> Result<Box<dyn RelayConnection>> {
        let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| RelayError::Socket(e.to_string()))?;
        Ok(Box::new(WsConnection {
            stream,
            closed: false,
        }))
    }
}

struct WsConnection {
    stream: WsStream,
    closed: bool,
}

#[async_trait]
impl RelayConnection for WsConnection {
    async fn send(&mut self, frame: String) -> Result<()> {
        self.stream
            .send(Message::Text(frame))
            .await
            .map_err(|e| RelayError::Socket(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Close(frame))) => {
                    trace!(frame = ?frame, "relay closed connection");
                    return None;
                }
                Some(Ok(_)) => continue,
                Some(Err(tungstenite::Error::ConnectionClosed)) | None => return None,
                Some(Err(e)) => return Some(Err(RelayError::Socket(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.stream.close(None).await;
    }
}

/// Scripted in-memory relays for testing.
pub mod memory {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use serde_json::Value;

    /// How a scripted relay reacts to a published event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RelayBehaviour {
        /// Answer `["OK", id, accepted, message]`.
        Ack { accepted: bool, message: String },
        /// Send a notice and an ack for some other event first, then ack.
        NoticeThenAck { accepted: bool, message: String },
        /// Close cleanly without acknowledging.
        CloseWithoutAck,
        /// Fail the connection after the event is sent.
        SocketError,
        /// Never answer and never close.
        Silent,
        /// Refuse the connection.
        Refuse,
        /// Accept the event, then never complete the closing handshake.
        StallOnClose,
    }

    impl RelayBehaviour {
        /// Accept with an empty reason.
        pub fn accept() -> Self {
            RelayBehaviour::Ack {
                accepted: true,
                message: String::new(),
            }
        }

        /// Reject with a reason.
        pub fn reject(message: impl Into<String>) -> Self {
            RelayBehaviour::Ack {
                accepted: false,
                message: message.into(),
            }
        }
    }

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        closes: AtomicUsize,
    }

    /// A set of scripted relays keyed by endpoint.
    ///
    /// Endpoints without a script behave like [`RelayBehaviour::accept`].
    #[derive(Clone, Default)]
    pub struct MemoryRelayNetwork {
        scripts: Arc<Mutex<HashMap<String, RelayBehaviour>>>,
        received: Arc<Mutex<Vec<(String, String)>>>,
        counters: Arc<Counters>,
    }

    impl MemoryRelayNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the relay at `url`.
        pub fn set_behaviour(&self, url: &str, behaviour: RelayBehaviour) {
            if let Ok(mut scripts) = self.scripts.lock() {
                scripts.insert(url.to_string(), behaviour);
            }
        }

        /// Builder form of [`set_behaviour`](Self::set_behaviour).
        pub fn with_relay(self, url: &str, behaviour: RelayBehaviour) -> Self {
            self.set_behaviour(url, behaviour);
            self
        }

        /// Connection attempts so far, refused ones included.
        pub fn connect_count(&self) -> usize {
            self.counters.connects.load(Ordering::SeqCst)
        }

        /// Connections closed by the client.
        pub fn close_count(&self) -> usize {
            self.counters.closes.load(Ordering::SeqCst)
        }

        /// Every `(relay, frame)` sent so far.
        pub fn received(&self) -> Vec<(String, String)> {
            self.received.lock().map(|r| r.clone()).unwrap_or_default()
        }

        /// Relays that received at least one frame, in arrival order.
        pub fn relays_reached(&self) -> Vec<String> {
            let mut relays: Vec<String> = Vec::new();
            for (relay, _) in self.received() {
                if !relays.contains(&relay) {
                    relays.push(relay);
                }
            }
            relays
        }

        fn behaviour_for(&self, url: &str) -> RelayBehaviour {
            self.scripts
                .lock()
                .ok()
                .and_then(|s| s.get(url).cloned())
                .unwrap_or_else(RelayBehaviour::accept)
        }
    }

    #[async_trait]
    impl RelayConnector for MemoryRelayNetwork {
        async fn connect(&self, url: &RelayUrl) -> Result<Box<dyn RelayConnection>> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            let behaviour = self.behaviour_for(url.as_str());
            if behaviour == RelayBehaviour::Refuse {
                return Err(RelayError::Socket("connection refused".into()));
            }
            Ok(Box::new(MemoryConnection {
                url: url.to_string(),
                behaviour,
                inbox: VecDeque::new(),
                network: self.clone(),
                closed: false,
            }))
        }
    }

    struct MemoryConnection {
        url: String,
        behaviour: RelayBehaviour,
        inbox: VecDeque<Result<String>>,
        network: MemoryRelayNetwork,
        closed: bool,
    }

    fn ok_frame(id: &str, accepted: bool, message: &str) -> String {
        serde_json::json!(["OK", id, accepted, message]).to_string()
    }

    #[async_trait]
    impl RelayConnection for MemoryConnection {
        async fn send(&mut self, frame: String) -> Result<()> {
            if self.closed {
                return Err(RelayError::Socket("connection closed".into()));
            }
            let event_id = serde_json::from_str::<Value>(&frame)
                .ok()
                .and_then(|v| v.get(1)?.get("id")?.as_str().map(str::to_string))
                .unwrap_or_default();
            if let Ok(mut received) = self.network.received.lock() {
                received.push((self.url.clone(), frame));
            }

            match &self.behaviour {
                RelayBehaviour::Ack { accepted, message } => {
                    self.inbox.push_back(Ok(ok_frame(&event_id, *accepted, message)));
                }
                RelayBehaviour::NoticeThenAck { accepted, message } => {
                    self.inbox
                        .push_back(Ok(r#"["NOTICE","slow down"]"#.to_string()));
                    self.inbox.push_back(Ok(ok_frame(&"0".repeat(64), false, "other event")));
                    self.inbox.push_back(Ok("garbage".to_string()));
                    self.inbox.push_back(Ok(ok_frame(&event_id, *accepted, message)));
                }
                RelayBehaviour::StallOnClose => {
                    self.inbox.push_back(Ok(ok_frame(&event_id, true, "")));
                }
                RelayBehaviour::SocketError => {
                    self.inbox
                        .push_back(Err(RelayError::Socket("connection reset".into())));
                }
                RelayBehaviour::CloseWithoutAck | RelayBehaviour::Silent | RelayBehaviour::Refuse => {}
            }
            Ok(())
        }

        async fn recv(&mut self) -> Option<Result<String>> {
            if let Some(next) = self.inbox.pop_front() {
                return Some(next);
            }
            if self.behaviour == RelayBehaviour::Silent && !self.closed {
                std::future::pending::<()>().await;
            }
            None
        }

        async fn close(&mut self) {
            if !self.closed {
                self.closed = true;
                self.network.counters.closes.fetch_add(1, Ordering::SeqCst);
                if self.behaviour == RelayBehaviour::StallOnClose {
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{MemoryRelayNetwork, RelayBehaviour};
    use super::*;

    #[tokio::test]
    async fn test_memory_relay_acks_sent_event() {
        let network = MemoryRelayNetwork::new();
        let url = RelayUrl::parse("wss://relay.example.com").unwrap();
        let mut conn = network.connect(&url).await.unwrap();

        conn.send(r#"["EVENT",{"id":"abc"}]"#.to_string()).await.unwrap();
        let frame = conn.recv().await.unwrap().unwrap();
        assert_eq!(frame, r#"["OK","abc",true,""]"#);
        assert!(conn.recv().await.is_none());

        conn.close().await;
        conn.close().await;
        assert_eq!(network.connect_count(), 1);
        assert_eq!(network.close_count(), 1);
        assert_eq!(network.relays_reached(), vec!["wss://relay.example.com"]);
    }

    #[tokio::test]
    async fn test_memory_relay_refuses() {
        let network = MemoryRelayNetwork::new()
            .with_relay("wss://down.example.com", RelayBehaviour::Refuse);
        let url = RelayUrl::parse("wss://down.example.com").unwrap();
        assert!(matches!(
            network.connect(&url).await,
            Err(RelayError::Socket(_))
        ));
        assert_eq!(network.connect_count(), 1);
    }
}
