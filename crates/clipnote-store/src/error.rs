//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during history store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock holder panicked.
    #[error("store lock poisoned")]
    Poisoned,

    /// The blocking worker did not complete.
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
