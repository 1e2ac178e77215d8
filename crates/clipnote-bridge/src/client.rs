//! Typed access to a signer.
//!
//! [`SignerCapability`] is what the rest of the system talks to. Two
//! implementations exist: [`BridgeClient`] goes through a bridge session and
//! its correlation/timeout/token machinery, [`DirectSigner`] calls a signer in
//! the same trust domain. Both report the same errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clipnote_core::{is_hex, UnsignedEvent, PUBKEY_HEX_LEN};
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::messages::BridgeMethod;
use crate::preferences::RelayPreferences;
use crate::session::BridgeSession;
use crate::signer::{invoke, Signer, SignerInfo};

/// The five signer operations.
#[async_trait]
pub trait SignerCapability: Send + Sync {
    /// Is any signer present?
    async fn has_signer(&self) -> Result<bool>;

    /// Signer name and exposed methods.
    async fn signer_info(&self) -> Result<SignerInfo>;

    /// Author public key, validated as 64 hex characters.
    async fn public_key(&self) -> Result<String>;

    /// Ask the signer to sign a draft. The answer is untrusted and must be
    /// verified before use.
    async fn sign_event(&self, event: &UnsignedEvent) -> Result<Value>;

    /// Relay preferences.
    async fn relay_preferences(&self) -> Result<RelayPreferences>;
}

/// [`SignerCapability`] over a bridge session.
#[derive(Clone)]
pub struct BridgeClient {
    session: Arc<BridgeSession>,
}

impl BridgeClient {
    pub fn new(session: Arc<BridgeSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<BridgeSession> {
        &self.session
    }

    fn query_timeout(&self) -> Option<Duration> {
        Some(self.session.config().query_timeout)
    }
}

#[async_trait]
impl SignerCapability for BridgeClient {
    async fn has_signer(&self) -> Result<bool> {
        let value = self
            .session
            .call_method(BridgeMethod::PresenceCheck, vec![], None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn signer_info(&self) -> Result<SignerInfo> {
        let value = self
            .session
            .call_method(BridgeMethod::IdentityQuery, vec![], self.query_timeout())
            .await?;
        parse_signer_info(value)
    }

    async fn public_key(&self) -> Result<String> {
        let value = self
            .session
            .call_method(BridgeMethod::PublicKey, vec![], self.query_timeout())
            .await?;
        parse_public_key(value)
    }

    async fn sign_event(&self, event: &UnsignedEvent) -> Result<Value> {
        let draft = draft_value(event)?;
        self.session
            .call_method(BridgeMethod::Sign, vec![draft], None)
            .await
    }

    async fn relay_preferences(&self) -> Result<RelayPreferences> {
        let value = self
            .session
            .call_method(BridgeMethod::RelayPreferences, vec![], None)
            .await?;
        Ok(RelayPreferences::from_value(&value))
    }
}

/// [`SignerCapability`] without an isolation boundary.
#[derive(Clone, Default)]
pub struct DirectSigner {
    signer: Option<Arc<dyn Signer>>,
}

impl DirectSigner {
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        Self {
            signer: Some(signer),
        }
    }

    /// No signer installed: every signer operation fails.
    pub fn absent() -> Self {
        Self { signer: None }
    }

    async fn invoke(&self, method: BridgeMethod, params: Vec<Value>) -> Result<Value> {
        invoke(self.signer.as_deref(), method, params)
            .await
            .map_err(BridgeError::Capability)
    }
}

#[async_trait]
impl SignerCapability for DirectSigner {
    async fn has_signer(&self) -> Result<bool> {
        Ok(self.signer.is_some())
    }

    async fn signer_info(&self) -> Result<SignerInfo> {
        parse_signer_info(self.invoke(BridgeMethod::IdentityQuery, vec![]).await?)
    }

    async fn public_key(&self) -> Result<String> {
        parse_public_key(self.invoke(BridgeMethod::PublicKey, vec![]).await?)
    }

    async fn sign_event(&self, event: &UnsignedEvent) -> Result<Value> {
        self.invoke(BridgeMethod::Sign, vec![draft_value(event)?]).await
    }

    async fn relay_preferences(&self) -> Result<RelayPreferences> {
        let value = self.invoke(BridgeMethod::RelayPreferences, vec![]).await?;
        Ok(RelayPreferences::from_value(&value))
    }
}

fn draft_value(event: &UnsignedEvent) -> Result<Value> {
    serde_json::to_value(event).map_err(|e| BridgeError::InvalidResponse(e.to_string()))
}

fn parse_signer_info(value: Value) -> Result<SignerInfo> {
    serde_json::from_value(value)
        .map_err(|e| BridgeError::InvalidResponse(format!("signer info: {}", e)))
}

fn parse_public_key(value: Value) -> Result<String> {
    match value.as_str() {
        Some(key) if is_hex(key, PUBKEY_HEX_LEN) => Ok(key.to_string()),
        _ => Err(BridgeError::InvalidResponse(
            "public key is not 64 hex characters".into(),
        )),
    }
}
