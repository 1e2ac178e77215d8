//! Error types for Clipnote Core.

use thiserror::Error;

/// Core errors that can occur while decoding event data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::DecodingError(e.to_string())
    }
}

/// Reasons a signed event is refused when compared to its draft.
///
/// Every variant is fatal: an event that fails any of these checks is never
/// published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("Signer returned an invalid event payload.")]
    NotAnObject,

    #[error("Signer returned malformed event fields.")]
    Malformed,

    #[error("Signer pubkey mismatch.")]
    PubkeyMismatch,

    #[error("Signer changed event payload unexpectedly.")]
    PayloadChanged,

    #[error("Signer changed event timestamp unexpectedly.")]
    TimestampChanged,

    #[error("Signer changed event tags unexpectedly.")]
    TagsChanged,

    #[error("Signer returned event id that fails integrity check.")]
    IdMismatch { expected: String, actual: String },
}
