//! Bridge wire messages.
//!
//! Every message on the shared channel is a JSON object labeled with a
//! `source` (which side sent it), a `type` (request, response or ready) and the
//! session's `bridgeToken`. Both sides see everything posted to the channel and
//! must filter for the messages meant for them.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// Source tag of messages posted by the caller (the isolated side).
pub const SOURCE_EXTENSION: &str = "clipnote-extension";

/// Source tag of messages posted by the capability provider (the page side).
pub const SOURCE_PAGE: &str = "clipnote-page";

/// Type tag of a request.
pub const REQUEST_TYPE: &str = "CLIPNOTE_SIGNER_REQUEST";

/// Type tag of a response.
pub const RESPONSE_TYPE: &str = "CLIPNOTE_SIGNER_RESPONSE";

/// Type tag of the provider's readiness signal.
pub const READY_TYPE: &str = "CLIPNOTE_BRIDGE_READY";

/// The fixed allow-list of signer capabilities reachable over the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeMethod {
    /// Is any signer present?
    #[serde(rename = "hasNostr")]
    PresenceCheck,
    /// Signer name and the methods it exposes.
    #[serde(rename = "getSignerInfo")]
    IdentityQuery,
    /// Author public key.
    #[serde(rename = "getPublicKey")]
    PublicKey,
    /// Sign a draft event.
    #[serde(rename = "signEvent")]
    Sign,
    /// Endpoint -> read/write preferences.
    #[serde(rename = "getRelays")]
    RelayPreferences,
}

impl BridgeMethod {
    /// Every allowed method.
    pub const ALL: [BridgeMethod; 5] = [
        BridgeMethod::PresenceCheck,
        BridgeMethod::IdentityQuery,
        BridgeMethod::PublicKey,
        BridgeMethod::Sign,
        BridgeMethod::RelayPreferences,
    ];

    /// Wire name of the method.
    pub const fn as_str(self) -> &'static str {
        match self {
            BridgeMethod::PresenceCheck => "hasNostr",
            BridgeMethod::IdentityQuery => "getSignerInfo",
            BridgeMethod::PublicKey => "getPublicKey",
            BridgeMethod::Sign => "signEvent",
            BridgeMethod::RelayPreferences => "getRelays",
        }
    }

    /// Look up a wire name in the allow-list.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for BridgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BridgeMethod {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| BridgeError::UnsupportedMethod(s.to_string()))
    }
}

/// Shared secret fixed when a bridge session is created.
///
/// The provider answers only requests carrying this token and echoes it on
/// every response, which keeps other scripts on the channel from
/// impersonating either side.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BridgeToken(String);

impl BridgeToken {
    /// Generate a fresh random token (128 bits, hex).
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap an existing token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a token carried by a message.
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        candidate == Some(self.0.as_str())
    }
}

impl fmt::Debug for BridgeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BridgeToken(<redacted>)")
    }
}

/// A message on the bridge channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// Caller -> provider.
    #[serde(rename = "CLIPNOTE_SIGNER_REQUEST", rename_all = "camelCase")]
    Request {
        source: String,
        id: String,
        method: String,
        #[serde(default)]
        params: Vec<Value>,
        #[serde(default)]
        bridge_token: Option<String>,
    },

    /// Provider -> caller.
    #[serde(rename = "CLIPNOTE_SIGNER_RESPONSE", rename_all = "camelCase")]
    Response {
        source: String,
        id: String,
        #[serde(default)]
        bridge_token: Option<String>,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Provider announces it is listening.
    #[serde(rename = "CLIPNOTE_BRIDGE_READY", rename_all = "camelCase")]
    Ready {
        source: String,
        #[serde(default)]
        bridge_token: Option<String>,
    },
}

impl BridgeMessage {
    /// Build a request from the caller side.
    pub fn request(id: &str, method: BridgeMethod, params: Vec<Value>, token: &BridgeToken) -> Self {
        BridgeMessage::Request {
            source: SOURCE_EXTENSION.to_string(),
            id: id.to_string(),
            method: method.as_str().to_string(),
            params,
            bridge_token: Some(token.as_str().to_string()),
        }
    }

    /// Build a provider response from a dispatch result.
    pub fn response(id: &str, token: Option<&BridgeToken>, outcome: Result<Value, String>) -> Self {
        let bridge_token = token.map(|t| t.as_str().to_string());
        match outcome {
            Ok(result) => BridgeMessage::Response {
                source: SOURCE_PAGE.to_string(),
                id: id.to_string(),
                bridge_token,
                ok: true,
                result: Some(result),
                error: None,
            },
            Err(error) => BridgeMessage::Response {
                source: SOURCE_PAGE.to_string(),
                id: id.to_string(),
                bridge_token,
                ok: false,
                result: None,
                error: Some(error),
            },
        }
    }

    /// Build the provider's readiness signal.
    pub fn ready(token: Option<&BridgeToken>) -> Self {
        BridgeMessage::Ready {
            source: SOURCE_PAGE.to_string(),
            bridge_token: token.map(|t| t.as_str().to_string()),
        }
    }

    /// Source tag of the message.
    pub fn source(&self) -> &str {
        match self {
            BridgeMessage::Request { source, .. }
            | BridgeMessage::Response { source, .. }
            | BridgeMessage::Ready { source, .. } => source,
        }
    }

    /// Token carried by the message, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            BridgeMessage::Request { bridge_token, .. }
            | BridgeMessage::Response { bridge_token, .. }
            | BridgeMessage::Ready { bridge_token, .. } => bridge_token.as_deref(),
        }
    }

    /// Encode for the channel.
    pub fn to_value(&self) -> Value {
        // Every field is a string, bool, or already a JSON value.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Decode a channel message. Anything foreign yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
