//! History store trait and record type.
//!
//! The history is a capped list of annotated moments. It is consumed by the
//! share flow through `upsert`, `list` and `delete_by_id` only, so any
//! key-value backend can sit behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default maximum number of records kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 300;

/// Configuration for history stores.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Records beyond this count are evicted, oldest first.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// One saved moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Stable record id.
    pub id: String,
    pub video_id: String,
    pub title: String,
    pub channel: String,
    /// Selected moment, whole seconds.
    pub timestamp: u64,
    pub preview_image: String,
    pub comment: String,
    /// First save (Unix ms).
    pub saved_at: u64,
    /// Latest save (Unix ms).
    pub updated_at: u64,
    /// Id of the published note, once shared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// When the note was published (Unix ms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<u64>,
}

/// The HistoryStore trait: async interface for history persistence.
///
/// # Ordering
///
/// `list` returns records newest first by creation. Updating a record keeps
/// its position; only new records go to the front. When the store is over
/// capacity the oldest records are dropped.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert a new record or replace the one with the same id.
    async fn upsert(&self, record: HistoryRecord) -> Result<HistoryRecord>;

    /// Get a record by id.
    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<HistoryRecord>>;

    /// Remove a record. Removing an unknown id is not an error.
    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Number of records.
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
