//! rollcall-store: SQLite-backed persistence gateway.
//!
//! Every collection blob lives in one row of the `blobs` table, keyed by the
//! gateway key (`known_faces`, `attendance_records`). Writes replace the row
//! in a single statement, so a crash leaves either the old or the new blob.

use chrono::Utc;
use rollcall_core::{PersistenceError, PersistenceGateway};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Persistence gateway over a single SQLite database file.
pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::info!(path = %path.display(), journal_mode = %mode, "opened attendance database");

        Self::init(conn)
    }

    /// Database that lives only as long as the gateway.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS blobs (
                 key        TEXT PRIMARY KEY,
                 value      BLOB NOT NULL,
                 updated_at TEXT NOT NULL
             );",
        )?;
        Ok(Self { conn })
    }

    /// Keys that currently hold a blob, sorted.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key FROM blobs ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    /// RFC 3339 time of the last write to `key`.
    pub fn updated_at(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT updated_at FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn load_blob(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM blobs WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn save_blob(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO blobs (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, blob, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl PersistenceGateway for SqliteGateway {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        self.load_blob(key).map_err(|e| PersistenceError::LoadFailed {
            key: key.into(),
            reason: e.to_string(),
        })
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistenceError> {
        tracing::debug!(key, bytes = blob.len(), "saving blob");
        self.save_blob(key, blob).map_err(|e| PersistenceError::WriteFailed {
            key: key.into(),
            reason: e.to_string(),
        })
    }
}
