//! SQLite implementation of the HistoryStore trait.
//!
//! rusqlite with bundled SQLite; every operation runs on the blocking pool
//! through `spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{HistoryConfig, HistoryRecord, HistoryStore};

/// SQLite-backed history.
pub struct SqliteHistory {
    conn: Arc<Mutex<Connection>>,
    config: HistoryConfig,
}

impl SqliteHistory {
    /// Open (and migrate) a database file.
    pub fn open(path: impl AsRef<Path>, config: HistoryConfig) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Open an in-memory database.
    pub fn open_memory(config: HistoryConfig) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

const SELECT_COLUMNS: &str = "id, video_id, title, channel, timestamp, preview_image, comment,
     saved_at, updated_at, event_id, published_at";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.get("id")?,
        video_id: row.get("video_id")?,
        title: row.get("title")?,
        channel: row.get("channel")?,
        timestamp: row.get::<_, i64>("timestamp")?.max(0) as u64,
        preview_image: row.get("preview_image")?,
        comment: row.get("comment")?,
        saved_at: row.get::<_, i64>("saved_at")?.max(0) as u64,
        updated_at: row.get::<_, i64>("updated_at")?.max(0) as u64,
        event_id: row.get("event_id")?,
        published_at: row
            .get::<_, Option<i64>>("published_at")?
            .map(|t| t.max(0) as u64),
    })
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn upsert(&self, record: HistoryRecord) -> Result<HistoryRecord> {
        let capacity = self.config.capacity as i64;
        let stored = record.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            // ON CONFLICT keeps the row, and with it the creation order.
            tx.execute(
                "INSERT INTO history (
                    id, video_id, title, channel, timestamp, preview_image, comment,
                    saved_at, updated_at, event_id, published_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ON CONFLICT(id) DO UPDATE SET
                    video_id = excluded.video_id,
                    title = excluded.title,
                    channel = excluded.channel,
                    timestamp = excluded.timestamp,
                    preview_image = excluded.preview_image,
                    comment = excluded.comment,
                    saved_at = excluded.saved_at,
                    updated_at = excluded.updated_at,
                    event_id = excluded.event_id,
                    published_at = excluded.published_at",
                params![
                    stored.id,
                    stored.video_id,
                    stored.title,
                    stored.channel,
                    stored.timestamp as i64,
                    stored.preview_image,
                    stored.comment,
                    stored.saved_at as i64,
                    stored.updated_at as i64,
                    stored.event_id,
                    stored.published_at.map(|t| t as i64),
                ],
            )?;
            tx.execute(
                "DELETE FROM history WHERE seq NOT IN (
                    SELECT seq FROM history ORDER BY seq DESC LIMIT ?1
                )",
                params![capacity],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await?;

        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>> {
        let id = id.to_string();
        self.blocking(move |conn| {
            conn.query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM history WHERE id = ?1"),
                params![id],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM history ORDER BY seq DESC"))?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.blocking(move |conn| {
            conn.execute("DELETE FROM history WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }

    async fn len(&self) -> Result<usize> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
        .await
    }
}
