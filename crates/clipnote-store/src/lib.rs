//! # Clipnote Store
//!
//! Persistence for the clip history: saved moments, their comments, and
//! whether they have been published.
//!
//! ## Implementations
//!
//! - [`SqliteHistory`] - primary backend (SQLite via rusqlite)
//! - [`MemoryHistory`] - in-memory backend for testing
//!
//! ## Design
//!
//! The [`HistoryStore`] trait is async so the share flow never blocks on
//! storage. SQLite work runs on the blocking pool.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryHistory;
pub use sqlite::SqliteHistory;
pub use traits::{HistoryConfig, HistoryRecord, HistoryStore, DEFAULT_HISTORY_CAPACITY};

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
