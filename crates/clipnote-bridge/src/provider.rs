//! The in-context capability provider.
//!
//! The provider lives next to the signer, on the far side of the isolation
//! boundary. It listens on the shared channel, answers only requests carrying
//! the token it was launched with, and forwards allow-listed methods to the
//! signer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::channel::{next_message, BridgeChannel};
use crate::messages::{BridgeMessage, BridgeMethod, BridgeToken, SOURCE_EXTENSION};
use crate::signer::{invoke, Signer};

/// Answers bridge requests on behalf of a signer.
#[derive(Clone)]
pub struct CapabilityProvider {
    channel: BridgeChannel,
    token: Option<BridgeToken>,
    signer: Option<Arc<dyn Signer>>,
}

impl CapabilityProvider {
    /// Create a provider.
    ///
    /// A provider launched without a token answers nothing. `signer` is
    /// `None` when no signer is installed in the context.
    pub fn new(
        channel: BridgeChannel,
        token: Option<BridgeToken>,
        signer: Option<Arc<dyn Signer>>,
    ) -> Self {
        Self {
            channel,
            token,
            signer,
        }
    }

    /// Start listening and announce readiness.
    ///
    /// The subscription is taken before the ready signal is posted, so no
    /// request sent in reaction to it can be missed.
    pub fn spawn(self) -> JoinHandle<()> {
        let rx = self.channel.subscribe();
        self.channel
            .post(BridgeMessage::ready(self.token.as_ref()).to_value());

        let provider = Arc::new(self);
        tokio::spawn(async move {
            let mut rx = rx;
            while let Some(value) = next_message(&mut rx).await {
                let Some((id, method, params)) = provider.accept(&value) else {
                    continue;
                };
                let provider = Arc::clone(&provider);
                tokio::spawn(async move {
                    let outcome = provider.dispatch(&method, params).await;
                    provider.respond(&id, outcome);
                });
            }
            debug!("capability provider stopped");
        })
    }

    /// Filter a channel message down to an authorized request.
    fn accept(&self, value: &Value) -> Option<(String, String, Vec<Value>)> {
        let BridgeMessage::Request {
            source,
            id,
            method,
            params,
            bridge_token,
        } = BridgeMessage::from_value(value)?
        else {
            return None;
        };
        if source != SOURCE_EXTENSION {
            return None;
        }
        match &self.token {
            Some(token) if token.matches(bridge_token.as_deref()) => Some((id, method, params)),
            _ => {
                trace!(id = %id, "request with foreign token ignored");
                None
            }
        }
    }

    /// Run one request. The allow-list is enforced again on this side.
    pub async fn dispatch(&self, method: &str, params: Vec<Value>) -> Result<Value, String> {
        let Some(method) = BridgeMethod::from_wire(method) else {
            return Err(format!("Signer method blocked: {}", method));
        };
        invoke(self.signer.as_deref(), method, params).await
    }

    fn respond(&self, id: &str, outcome: Result<Value, String>) {
        self.channel
            .post(BridgeMessage::response(id, self.token.as_ref(), outcome).to_value());
    }
}

/// Error raised when the isolated context cannot be established.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct LaunchError(pub String);

/// Establishes the isolated context that hosts a [`CapabilityProvider`].
#[async_trait]
pub trait ContextLauncher: Send + Sync {
    /// Start a provider bound to `token` on `channel`.
    ///
    /// Returning `Ok` means the context was created; readiness is signalled
    /// separately over the channel.
    async fn launch(&self, channel: &BridgeChannel, token: &BridgeToken) -> Result<(), LaunchError>;
}

/// Runs the provider as a task in the current runtime.
///
/// Relaunching replaces the previous provider. Every provider task is
/// aborted when the launcher is dropped.
pub struct InProcessLauncher {
    signer: Option<Arc<dyn Signer>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl InProcessLauncher {
    /// Launcher for a context with the given signer installed.
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        Self {
            signer: Some(signer),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Launcher for a context with no signer installed.
    pub fn without_signer() -> Self {
        Self {
            signer: None,
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn abort_all(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

#[async_trait]
impl ContextLauncher for InProcessLauncher {
    async fn launch(&self, channel: &BridgeChannel, token: &BridgeToken) -> Result<(), LaunchError> {
        self.abort_all();
        let provider = CapabilityProvider::new(channel.clone(), Some(token.clone()), self.signer.clone());
        let handle = provider.spawn();
        self.tasks
            .lock()
            .map_err(|_| LaunchError("launcher state poisoned".into()))?
            .push(handle);
        debug!("in-process capability provider launched");
        Ok(())
    }
}

impl Drop for InProcessLauncher {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{BridgeMessage, READY_TYPE, SOURCE_PAGE};
    use crate::signer::SignerError;
    use serde_json::json;

    struct KeyOnly;

    #[async_trait]
    impl Signer for KeyOnly {
        async fn get_public_key(&self) -> Result<Value, SignerError> {
            Ok(json!("11".repeat(32)))
        }

        async fn sign_event(&self, _event: Value) -> Result<Value, SignerError> {
            Err(SignerError::new("User rejected"))
        }

        async fn get_relays(&self) -> Result<Value, SignerError> {
            Ok(json!({}))
        }
    }

    async fn next_response(rx: &mut tokio::sync::broadcast::Receiver<Value>) -> BridgeMessage {
        loop {
            let value = next_message(rx).await.unwrap();
            if let Some(msg @ BridgeMessage::Response { .. }) = BridgeMessage::from_value(&value) {
                return msg;
            }
        }
    }

    #[tokio::test]
    async fn test_provider_announces_ready() {
        let channel = BridgeChannel::default();
        let mut rx = channel.subscribe();
        let token = BridgeToken::new("tok");
        let _task = CapabilityProvider::new(channel.clone(), Some(token), None).spawn();

        let ready = next_message(&mut rx).await.unwrap();
        assert_eq!(ready["type"], READY_TYPE);
        assert_eq!(ready["source"], SOURCE_PAGE);
        assert_eq!(ready["bridgeToken"], "tok");
    }

    #[tokio::test]
    async fn test_provider_answers_and_echoes_token() {
        let channel = BridgeChannel::default();
        let token = BridgeToken::new("tok");
        let mut rx = channel.subscribe();
        let _task =
            CapabilityProvider::new(channel.clone(), Some(token.clone()), Some(Arc::new(KeyOnly)))
                .spawn();

        channel.post(BridgeMessage::request("1", BridgeMethod::PublicKey, vec![], &token).to_value());
        let BridgeMessage::Response { id, ok, result, bridge_token, .. } = next_response(&mut rx).await
        else {
            unreachable!()
        };
        assert_eq!(id, "1");
        assert!(ok);
        assert_eq!(result, Some(json!("11".repeat(32))));
        assert_eq!(bridge_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_provider_reports_signer_errors() {
        let channel = BridgeChannel::default();
        let token = BridgeToken::new("tok");
        let mut rx = channel.subscribe();
        let _task =
            CapabilityProvider::new(channel.clone(), Some(token.clone()), Some(Arc::new(KeyOnly)))
                .spawn();

        channel.post(BridgeMessage::request("9", BridgeMethod::Sign, vec![json!({})], &token).to_value());
        let BridgeMessage::Response { ok, error, .. } = next_response(&mut rx).await else {
            unreachable!()
        };
        assert!(!ok);
        assert_eq!(error.as_deref(), Some("User rejected"));
    }

    #[tokio::test]
    async fn test_provider_blocks_unlisted_method() {
        let provider = CapabilityProvider::new(BridgeChannel::default(), None, Some(Arc::new(KeyOnly)));
        assert_eq!(
            provider.dispatch("signSchnorr", vec![]).await,
            Err("Signer method blocked: signSchnorr".to_string())
        );
    }

    #[tokio::test]
    async fn test_provider_ignores_wrong_token() {
        let provider = CapabilityProvider::new(
            BridgeChannel::default(),
            Some(BridgeToken::new("tok")),
            Some(Arc::new(KeyOnly)),
        );
        let forged = BridgeMessage::request("1", BridgeMethod::PublicKey, vec![], &BridgeToken::new("evil"));
        assert!(provider.accept(&forged.to_value()).is_none());

        let genuine = BridgeMessage::request("1", BridgeMethod::PublicKey, vec![], &BridgeToken::new("tok"));
        assert!(provider.accept(&genuine.to_value()).is_some());

        let tokenless = CapabilityProvider::new(BridgeChannel::default(), None, None);
        assert!(tokenless.accept(&genuine.to_value()).is_none());
    }

    #[tokio::test]
    async fn test_launcher_replaces_previous_provider() {
        let channel = BridgeChannel::default();
        let launcher = InProcessLauncher::without_signer();
        let token = BridgeToken::new("tok");

        launcher.launch(&channel, &token).await.unwrap();
        launcher.launch(&channel, &token).await.unwrap();
        assert_eq!(launcher.tasks.lock().unwrap().len(), 1);
    }
}
