//! Error types for the bridge module.

use thiserror::Error;

/// Errors that can occur during bridge operations.
///
/// Token or correlation-id mismatches never surface here: those messages are
/// noise on a shared channel and are dropped silently by the router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The session never reached `Ready`.
    #[error("{0}")]
    Initialization(String),

    /// Method is outside the allow-list. Nothing was sent.
    #[error("Unsupported signer method: {0}")]
    UnsupportedMethod(String),

    /// No correlated response arrived in time.
    #[error("Nostr request timed out: {method}")]
    Timeout { method: String },

    /// The signer side reported a failure.
    #[error("{0}")]
    Capability(String),

    /// The signer answered with something that does not decode.
    #[error("invalid signer response: {0}")]
    InvalidResponse(String),

    /// The shared channel or the response router is gone.
    #[error("bridge channel closed")]
    ChannelClosed,
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
