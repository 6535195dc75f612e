//! Storage layer for the time tracker.
//!
//! Provides the key-value persistence backend using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! A single `kv` table maps a text key to an opaque blob. The core crate
//! decides what the blobs contain (JSON today). `updated_at` is stored as TEXT
//! in RFC 3339 format with millisecond precision, for inspection only.
//!
//! Multi-key writes run in one transaction, so a crash never leaves the
//! session flags and the start time out of step.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use tracing::debug;

use mt_core::{KeyValueStore, KvWrite, StoreError};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The directory holding the database file could not be created.
    #[error("failed to create database directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it (and its parent
    /// directory) if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DbError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&mut self, key: &str, value: &[u8]) -> Result<(), DbError> {
        self.apply(&[(key, Some(value))])
    }

    /// Applies puts (`Some`) and removals (`None`) in one transaction.
    pub fn apply(&mut self, writes: &[(&str, Option<&[u8]>)]) -> Result<(), DbError> {
        if writes.is_empty() {
            return Ok(());
        }
        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let tx = self.conn.transaction()?;
        {
            let mut upsert = tx.prepare(
                "
                INSERT INTO kv (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                ",
            )?;
            let mut delete = tx.prepare("DELETE FROM kv WHERE key = ?1")?;
            for (key, value) in writes {
                match value {
                    Some(value) => {
                        upsert.execute(params![key, value, updated_at])?;
                    }
                    None => {
                        delete.execute([key])?;
                    }
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.get(key)
            .map_err(|e| StoreError::new("read", key, e))
    }

    fn save_all(&mut self, writes: &[KvWrite]) -> Result<(), StoreError> {
        let batch: Vec<(&str, Option<&[u8]>)> = writes
            .iter()
            .map(|write| match write {
                KvWrite::Put { key, value } => (*key, Some(value.as_slice())),
                KvWrite::Remove { key } => (*key, None),
            })
            .collect();
        self.apply(&batch).map_err(|e| {
            let keys: Vec<&str> = writes.iter().map(KvWrite::key).collect();
            StoreError::new("write", keys.join(","), e)
        })
    }
}
