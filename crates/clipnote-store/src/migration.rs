//! Database schema migrations for SQLite.
//!
//! Versioned: each migration moves the schema from version N to N+1 and is
//! recorded in `schema_migrations`.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;
        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, crate::now_millis() as i64],
            )?;
        }
        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "history schema migrated");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        2 => apply_v2(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// v1: saved moments.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE history (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,  -- creation order
            id TEXT NOT NULL UNIQUE,
            video_id TEXT NOT NULL,
            title TEXT NOT NULL,
            channel TEXT NOT NULL,
            timestamp INTEGER NOT NULL,             -- seconds into the video
            preview_image TEXT NOT NULL,
            comment TEXT NOT NULL,
            saved_at INTEGER NOT NULL,              -- Unix ms
            updated_at INTEGER NOT NULL             -- Unix ms
        );

        CREATE INDEX idx_history_video ON history(video_id);
        "#,
    )?;
    Ok(())
}

/// v2: publish tracking.
fn apply_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        ALTER TABLE history ADD COLUMN event_id TEXT;
        ALTER TABLE history ADD COLUMN published_at INTEGER;
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM pragma_table_info('history')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_migration_creates_history_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let cols = columns(&conn);
        for expected in ["seq", "id", "video_id", "comment", "event_id", "published_at"] {
            assert!(cols.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_upgrade_from_v1() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_migrations (version INTEGER PRIMARY KEY, applied_at INTEGER NOT NULL);",
        )
        .unwrap();
        apply_v1(&conn).unwrap();
        conn.execute("INSERT INTO schema_migrations VALUES (1, 0)", []).unwrap();

        migrate(&mut conn).unwrap();
        assert!(columns(&conn).contains(&"published_at".to_string()));
    }
}
