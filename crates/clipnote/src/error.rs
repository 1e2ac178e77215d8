//! Error types for the share flow.

use clipnote_bridge::BridgeError;
use clipnote_core::IntegrityError;
use clipnote_relay::PublishReport;
use clipnote_store::StoreError;
use thiserror::Error;

/// Errors that end a share attempt.
///
/// Per-relay failures are not here: they stay inside the [`PublishReport`]
/// unless no relay accepted the note.
#[derive(Debug, Error)]
pub enum ShareError {
    /// Identity query found no usable signer.
    #[error("No active signer. Click \"Check signer\" first.")]
    NoSigner,

    /// Bridge initialization, capability, or timeout failure.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The signed note does not match its draft.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Signed and verified, but no relay accepted it.
    #[error("Signed, but failed to publish to relays.")]
    PublishFailed { report: PublishReport },

    /// History storage failed on an explicit save.
    #[error("Could not save to history: {0}")]
    Store(#[from] StoreError),
}

impl ShareError {
    /// Short status line for the user.
    pub fn status(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "Nostr share failed".to_string()
        } else {
            message
        }
    }
}

/// Result type for share operations.
pub type Result<T> = std::result::Result<T, ShareError>;
