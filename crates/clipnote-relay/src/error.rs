//! Error types for the relay module.

use thiserror::Error;

/// Errors that can occur while talking to a relay.
///
/// None of these abort a multi-relay publish; they become a failed
/// per-relay outcome.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Endpoint is not a `wss://` URL with a host.
    #[error("invalid relay URL: {0}")]
    InvalidUrl(String),

    /// Connect, send or receive failed.
    #[error("socket error: {0}")]
    Socket(String),

    /// Frame could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
