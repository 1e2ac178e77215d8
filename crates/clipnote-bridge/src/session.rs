//! Bridge Session
//!
//! The caller's end of the bridge: a correlated request/response RPC over the
//! shared channel.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized -> Initializing -> Ready
//!                       |
//!                       v
//!                    Failed -> (retry) Initializing
//! ```
//!
//! The first call launches the isolated context and waits for its readiness
//! signal. Concurrent callers share that one initialization.
//!
//! # Correlation
//!
//! Each call registers a single-use waiter keyed by a fresh correlation id.
//! The waiter is removed from the registry exactly once, by whichever of the
//! router (matching response) or the timeout gets there first. The loser
//! finds nothing to remove and does nothing. A call future dropped before it
//! settles removes its own waiter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::channel::{next_message, BridgeChannel};
use crate::error::{BridgeError, Result};
use crate::messages::{BridgeMessage, BridgeMethod, BridgeToken, SOURCE_PAGE};
use crate::provider::ContextLauncher;

/// Configuration for a bridge session.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long to wait for the provider's readiness signal.
    pub ready_timeout: Duration,
    /// Default per-call timeout.
    pub call_timeout: Duration,
    /// Timeout for identity and public key queries.
    pub query_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(8),
            call_timeout: Duration::from_secs(15),
            query_timeout: Duration::from_secs(12),
        }
    }
}

/// Session readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

type CallReply = std::result::Result<Value, String>;
type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<CallReply>>>>;

/// The caller side of a bridge.
pub struct BridgeSession {
    channel: BridgeChannel,
    token: BridgeToken,
    launcher: Arc<dyn ContextLauncher>,
    config: BridgeConfig,
    state: Mutex<SessionState>,
    /// Serializes initialization attempts.
    init_lock: tokio::sync::Mutex<()>,
    ready: Arc<watch::Sender<bool>>,
    pending: Pending,
    router: JoinHandle<()>,
}

impl BridgeSession {
    /// Create a session on `channel` with a fresh token.
    ///
    /// Nothing is launched until the first call. Must be called from within a
    /// tokio runtime.
    pub fn new(
        channel: BridgeChannel,
        launcher: Arc<dyn ContextLauncher>,
        config: BridgeConfig,
    ) -> Self {
        Self::with_token(channel, launcher, config, BridgeToken::generate())
    }

    /// Create a session with a caller-chosen token.
    pub fn with_token(
        channel: BridgeChannel,
        launcher: Arc<dyn ContextLauncher>,
        config: BridgeConfig,
        token: BridgeToken,
    ) -> Self {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (ready, _) = watch::channel(false);
        let ready = Arc::new(ready);

        let rx = channel.subscribe();
        let router = tokio::spawn(route_responses(
            rx,
            token.clone(),
            Arc::clone(&pending),
            Arc::clone(&ready),
        ));

        Self {
            channel,
            token,
            launcher,
            config,
            state: Mutex::new(SessionState::Uninitialized),
            init_lock: tokio::sync::Mutex::new(()),
            ready,
            pending,
            router,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(SessionState::Failed)
    }

    fn set_state(&self, state: SessionState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The session token.
    pub fn token(&self) -> &BridgeToken {
        &self.token
    }

    /// Number of calls still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Bring the session to `Ready`, launching the provider if needed.
    ///
    /// A failed session is retried on the next call.
    pub async fn ensure_ready(&self) -> Result<()> {
        if self.state() == SessionState::Ready {
            return Ok(());
        }

        let _guard = self.init_lock.lock().await;
        if self.state() == SessionState::Ready {
            return Ok(());
        }

        self.set_state(SessionState::Initializing);
        self.ready.send_replace(false);
        let mut ready_rx = self.ready.subscribe();

        if let Err(e) = self.launcher.launch(&self.channel, &self.token).await {
            warn!(error = %e, "bridge context launch failed");
            self.set_state(SessionState::Failed);
            return Err(BridgeError::Initialization(
                "Failed to inject Nostr bridge".into(),
            ));
        }

        let waited = tokio::time::timeout(self.config.ready_timeout, ready_rx.wait_for(|r| *r))
            .await
            .map(|r| r.map(|_| ()));
        match waited {
            Ok(Ok(())) => {
                self.set_state(SessionState::Ready);
                debug!("bridge session ready");
                Ok(())
            }
            Ok(Err(_)) | Err(_) => {
                warn!(
                    timeout_ms = self.config.ready_timeout.as_millis() as u64,
                    "bridge readiness signal not received"
                );
                self.set_state(SessionState::Failed);
                Err(BridgeError::Initialization(
                    "Failed to initialize Nostr bridge".into(),
                ))
            }
        }
    }

    /// Call a method by wire name.
    ///
    /// Names outside the allow-list fail before anything is posted.
    pub async fn call(
        &self,
        method: &str,
        params: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let method: BridgeMethod = method.parse()?;
        self.call_method(method, params, timeout).await
    }

    /// Call an allow-listed method.
    ///
    /// `timeout` defaults to the configured call timeout.
    pub async fn call_method(
        &self,
        method: BridgeMethod,
        params: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        self.ensure_ready().await?;

        let id = uuid::Uuid::new_v4().to_string();
        let (tx, mut rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| BridgeError::ChannelClosed)?
            .insert(id.clone(), tx);
        let _waiter = WaiterGuard {
            pending: Arc::clone(&self.pending),
            id: id.clone(),
        };

        debug!(id = %id, method = %method, "bridge request");
        self.channel
            .post(BridgeMessage::request(&id, method, params, &self.token).to_value());

        let limit = timeout.unwrap_or(self.config.call_timeout);
        let reply = match tokio::time::timeout(limit, &mut rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(BridgeError::ChannelClosed),
            Err(_) => {
                let removed = self
                    .pending
                    .lock()
                    .map(|mut p| p.remove(&id).is_some())
                    .unwrap_or(false);
                if removed {
                    debug!(id = %id, method = %method, "bridge request timed out");
                    return Err(BridgeError::Timeout {
                        method: method.to_string(),
                    });
                }
                // The router settled this waiter at the deadline.
                match rx.try_recv() {
                    Ok(reply) => reply,
                    Err(_) => {
                        return Err(BridgeError::Timeout {
                            method: method.to_string(),
                        })
                    }
                }
            }
        };

        reply.map_err(BridgeError::Capability)
    }
}

/// Removes a call's waiter when the call future is dropped before settling.
struct WaiterGuard {
    pending: Pending,
    id: String,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if pending.remove(&self.id).is_some() {
                trace!(id = %self.id, "abandoned bridge request removed");
            }
        }
    }
}

impl Drop for BridgeSession {
    fn drop(&mut self) {
        self.router.abort();
        debug!("bridge session dropped, router aborted");
    }
}

/// Route provider messages to their waiters.
async fn route_responses(
    mut rx: tokio::sync::broadcast::Receiver<Value>,
    token: BridgeToken,
    pending: Pending,
    ready: Arc<watch::Sender<bool>>,
) {
    while let Some(value) = next_message(&mut rx).await {
        let Some(message) = BridgeMessage::from_value(&value) else {
            continue;
        };
        if message.source() != SOURCE_PAGE {
            continue;
        }
        if !token.matches(message.token()) {
            trace!("bridge message with foreign token dropped");
            continue;
        }

        match message {
            BridgeMessage::Ready { .. } => {
                ready.send_replace(true);
            }
            BridgeMessage::Response {
                id,
                ok,
                result,
                error,
                ..
            } => {
                let waiter = pending.lock().ok().and_then(|mut p| p.remove(&id));
                let Some(waiter) = waiter else {
                    trace!(id = %id, "response without waiter dropped");
                    continue;
                };
                let reply = if ok {
                    Ok(result.unwrap_or(Value::Null))
                } else {
                    Err(error.unwrap_or_else(|| "Nostr request failed".to_string()))
                };
                let _ = waiter.send(reply);
            }
            BridgeMessage::Request { .. } => {}
        }
    }
}
