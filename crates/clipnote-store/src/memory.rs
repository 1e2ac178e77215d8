//! In-memory implementation of the HistoryStore trait.
//!
//! Same semantics as SQLite, no persistence. Used by tests and by callers
//! that keep history elsewhere.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::traits::{HistoryConfig, HistoryRecord, HistoryStore};

/// In-memory history. Index 0 is the newest record.
pub struct MemoryHistory {
    records: RwLock<Vec<HistoryRecord>>,
    config: HistoryConfig,
}

impl MemoryHistory {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            config,
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn upsert(&self, record: HistoryRecord) -> Result<HistoryRecord> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.insert(0, record.clone()),
        }
        records.truncate(self.config.capacity);
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.clone())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.retain(|r| r.id != id);
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.len())
    }
}
