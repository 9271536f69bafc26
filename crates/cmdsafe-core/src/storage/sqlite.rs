//! SQLite-backed command store.
//!
//! Each operation opens its own connection and closes it before returning, so
//! no file lock outlives a single command. Reads use a read-only connection
//! and never create the database; a missing file or table reads as empty.
//! Writes run inside an `IMMEDIATE` transaction, which serializes writers
//! while letting readers proceed.
//!
//! Schema:
//!
//! ```sql
//! CREATE TABLE commands (
//!     handle   TEXT PRIMARY KEY,
//!     envelope BLOB NOT NULL,
//!     saved_at TEXT NOT NULL
//! );
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};

use crate::error::{CmdsafeError, Result};
use crate::storage::traits::{CommandStore, StoredCommand};

/// Schema version recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// How long an operation waits for a competing lock before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS commands (
    handle   TEXT PRIMARY KEY,
    envelope BLOB NOT NULL,
    saved_at TEXT NOT NULL
);
"#;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open for reading. `None` means there is nothing stored yet.
    fn open_read(&self) -> Result<Option<Connection>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(self.busy_timeout)?;
        check_schema_version(&conn)?;

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'commands')",
            [],
            |row| row.get(0),
        )?;
        Ok(has_table.then_some(conn))
    }

    fn open_write(&self) -> Result<Connection> {
        crate::fs::ensure_parent_dir(&self.path).map_err(|e| {
            CmdsafeError::Storage(format!("Cannot create store directory: {}", e))
        })?;
        crate::fs::create_private_file(&self.path)
            .map_err(|e| CmdsafeError::Storage(format!("Cannot create store file: {}", e)))?;

        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        let version = check_schema_version(&conn)?;
        conn.execute_batch(CREATE_SCHEMA)?;
        if version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(conn)
    }
}

fn check_schema_version(conn: &Connection) -> Result<i64> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(CmdsafeError::Storage(format!(
            "Store schema version {} is newer than supported version {}",
            version, SCHEMA_VERSION
        )));
    }
    Ok(version)
}

fn parse_saved_at(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CmdsafeError::Storage(format!("Invalid saved_at timestamp: {}", e)))
}

impl CommandStore for SqliteStore {
    fn get(&self, handle: &str) -> Result<Option<Vec<u8>>> {
        let Some(conn) = self.open_read()? else {
            return Ok(None);
        };
        let envelope = conn
            .query_row(
                "SELECT envelope FROM commands WHERE handle = ?1",
                [handle],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(envelope)
    }

    fn put(&self, handle: &str, data: &[u8], replace: bool) -> Result<()> {
        let mut conn = self.open_write()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM commands WHERE handle = ?1)",
            [handle],
            |row| row.get(0),
        )?;
        if exists && !replace {
            return Err(CmdsafeError::HandleExists(handle.to_string()));
        }

        tx.execute(
            r#"
            INSERT INTO commands (handle, envelope, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(handle) DO UPDATE SET
                envelope = excluded.envelope,
                saved_at = excluded.saved_at
            "#,
            params![handle, data, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        tracing::debug!(handle, replaced = exists, "stored envelope");
        Ok(())
    }

    fn delete(&self, handle: &str) -> Result<()> {
        if !self.path.exists() {
            return Err(CmdsafeError::HandleNotFound(handle.to_string()));
        }
        let mut conn = self.open_write()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM commands WHERE handle = ?1", [handle])?;
        if removed == 0 {
            return Err(CmdsafeError::HandleNotFound(handle.to_string()));
        }
        tx.commit()?;

        tracing::debug!(handle, "deleted envelope");
        Ok(())
    }

    fn list_entries(&self) -> Result<Vec<StoredCommand>> {
        let Some(conn) = self.open_read()? else {
            return Ok(Vec::new());
        };
        let mut stmt = conn.prepare("SELECT handle, saved_at FROM commands ORDER BY handle")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (handle, saved_at) = row?;
            entries.push(StoredCommand {
                handle,
                saved_at: parse_saved_at(&saved_at)?,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("absent.db"));

        assert!(store.get("anything").unwrap().is_none());
        assert!(store.list_handles().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_delete_on_missing_file_does_not_create_it() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("absent.db"));

        assert!(matches!(
            store.delete("x"),
            Err(CmdsafeError::HandleNotFound(_))
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_schema_version_recorded() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("store.db"));
        store.put("a", b"x", false).unwrap();

        let conn = Connection::open(store.path()).unwrap();
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("store.db"));
        store.put("a", b"x", false).unwrap();

        let conn = Connection::open(store.path()).unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        drop(conn);

        assert!(matches!(store.get("a"), Err(CmdsafeError::Storage(_))));
        assert!(matches!(
            store.put("b", b"y", false),
            Err(CmdsafeError::Storage(_))
        ));
    }

    #[test]
    fn test_saved_at_roundtrip() {
        let parsed = parse_saved_at("2024-03-01T12:30:00+00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T12:30:00+00:00");
        assert!(parse_saved_at("yesterday").is_err());
    }
}
