//! The key holder on the far side of the bridge.
//!
//! A [`Signer`] exposes the NIP-07 shape: a public key, event signing, and relay
//! preferences. It never reveals the private key. Everything it returns is
//! untrusted and travels as raw JSON until the caller has validated it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::BridgeMethod;

/// Name reported when the signer offers no usable name.
pub const DEFAULT_SIGNER_NAME: &str = "NIP-07 signer";

/// Error raised by the signer itself, e.g. the user rejected the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SignerError(pub String);

impl SignerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An external signing capability.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Self-reported name candidates, best first. Blank entries and the
    /// generic `"object"` are skipped when resolving the display name.
    fn name_hints(&self) -> Vec<String> {
        Vec::new()
    }

    /// Wire names of the methods this signer implements.
    fn methods(&self) -> Vec<String> {
        vec![
            BridgeMethod::PublicKey.as_str().to_string(),
            BridgeMethod::Sign.as_str().to_string(),
            BridgeMethod::RelayPreferences.as_str().to_string(),
        ]
    }

    /// The author's public key.
    async fn get_public_key(&self) -> Result<Value, SignerError>;

    /// Sign a draft event. The result is whatever the signer returns.
    async fn sign_event(&self, event: Value) -> Result<Value, SignerError>;

    /// Endpoint -> `{read, write}` preferences.
    async fn get_relays(&self) -> Result<Value, SignerError>;
}

/// Answer to an identity query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerInfo {
    pub has_nostr: bool,
    #[serde(default)]
    pub signer_name: Option<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl SignerInfo {
    /// No signer present.
    pub fn absent() -> Self {
        Self {
            has_nostr: false,
            signer_name: None,
            methods: Vec::new(),
        }
    }

    /// Describe a present signer.
    pub fn from_signer(signer: &dyn Signer) -> Self {
        Self {
            has_nostr: true,
            signer_name: Some(resolve_name(&signer.name_hints())),
            methods: signer.methods(),
        }
    }

    /// Describe an optional signer.
    pub fn describe(signer: Option<&dyn Signer>) -> Self {
        signer.map_or_else(Self::absent, |s| Self::from_signer(s))
    }

    /// Display name, falling back to the generic label.
    pub fn display_name(&self) -> &str {
        self.signer_name.as_deref().unwrap_or(DEFAULT_SIGNER_NAME)
    }
}

fn resolve_name(hints: &[String]) -> String {
    hints
        .iter()
        .map(|hint| hint.trim())
        .find(|hint| !hint.is_empty() && !hint.eq_ignore_ascii_case("object"))
        .unwrap_or(DEFAULT_SIGNER_NAME)
        .to_string()
}

/// Dispatch one allow-listed method against an optional signer.
///
/// Shared by the in-context provider and the direct adapter so both report
/// the same errors.
pub(crate) async fn invoke(
    signer: Option<&dyn Signer>,
    method: BridgeMethod,
    params: Vec<Value>,
) -> Result<Value, String> {
    match method {
        BridgeMethod::PresenceCheck => Ok(Value::Bool(signer.is_some())),
        BridgeMethod::IdentityQuery => {
            serde_json::to_value(SignerInfo::describe(signer)).map_err(|e| e.to_string())
        }
        BridgeMethod::PublicKey | BridgeMethod::Sign | BridgeMethod::RelayPreferences => {
            let signer = signer.ok_or_else(|| "Nostr signer extension not found".to_string())?;
            forward(signer, method, params).await
        }
    }
}

async fn forward(signer: &dyn Signer, method: BridgeMethod, params: Vec<Value>) -> Result<Value, String> {
    if !signer.methods().iter().any(|m| m == method.as_str()) {
        return Err(format!("Signer method not available: {}", method));
    }

    let result = match method {
        BridgeMethod::Sign => {
            let event = params.into_iter().next().unwrap_or(Value::Null);
            signer.sign_event(event).await
        }
        BridgeMethod::RelayPreferences => signer.get_relays().await,
        _ => signer.get_public_key().await,
    };
    result.map_err(|e| e.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Named(Vec<&'static str>);

    #[async_trait]
    impl Signer for Named {
        fn name_hints(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }

        fn methods(&self) -> Vec<String> {
            vec!["getPublicKey".into()]
        }

        async fn get_public_key(&self) -> Result<Value, SignerError> {
            Ok(json!("ab".repeat(32)))
        }

        async fn sign_event(&self, _event: Value) -> Result<Value, SignerError> {
            Err(SignerError::new("not implemented"))
        }

        async fn get_relays(&self) -> Result<Value, SignerError> {
            Ok(json!({}))
        }
    }

    #[test]
    fn test_name_resolution() {
        assert_eq!(resolve_name(&[]), DEFAULT_SIGNER_NAME);
        assert_eq!(
            resolve_name(&["  ".into(), "Object".into(), " Alby ".into()]),
            "Alby"
        );
    }

    #[test]
    fn test_signer_info_wire_shape() {
        let info = SignerInfo::from_signer(&Named(vec!["nos2x"]));
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["hasNostr"], true);
        assert_eq!(value["signerName"], "nos2x");
        assert_eq!(value["methods"], json!(["getPublicKey"]));

        let absent = serde_json::to_value(SignerInfo::absent()).unwrap();
        assert_eq!(absent, json!({"hasNostr": false, "signerName": null, "methods": []}));
    }

    #[tokio::test]
    async fn test_invoke_without_signer() {
        assert_eq!(
            invoke(None, BridgeMethod::PresenceCheck, vec![]).await,
            Ok(json!(false))
        );
        assert_eq!(
            invoke(None, BridgeMethod::PublicKey, vec![]).await,
            Err("Nostr signer extension not found".to_string())
        );
    }

    #[tokio::test]
    async fn test_invoke_missing_method() {
        let signer = Named(vec![]);
        assert_eq!(
            invoke(Some(&signer), BridgeMethod::Sign, vec![json!({})]).await,
            Err("Signer method not available: signEvent".to_string())
        );
        assert_eq!(
            invoke(Some(&signer), BridgeMethod::PublicKey, vec![]).await,
            Ok(json!("ab".repeat(32)))
        );
    }
}
