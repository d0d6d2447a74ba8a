//! Storage layer for the customer registry.
//!
//! This module provides `SQLite`-based persistent key-value slots. The
//! registry serializes its whole record list into one slot, the local
//! equivalent of a browser storage key.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Path reported for in-memory databases.
const IN_MEMORY_PATH: &str = ":memory:";

/// Key-value slot storage backed by `SQLite`.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(IN_MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(IN_MEMORY_PATH),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn read_slot(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Overwrite the value stored under `key`.
    ///
    /// Returns `false` when the slot already held exactly this value and
    /// nothing was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn write_slot(&self, key: &str, value: &str) -> Result<bool> {
        let content_hash = blake3::hash(value.as_bytes()).to_hex().to_string();

        let current: Option<String> = self
            .conn
            .query_row(
                "SELECT content_hash FROM slots WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        if current.as_deref() == Some(content_hash.as_str()) {
            debug!("Slot {} unchanged (hash {}), skipping write", key, &content_hash[..16]);
            return Ok(false);
        }

        self.conn.execute(
            r"
            INSERT INTO slots (key, value, content_hash, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            ",
            params![key, value, content_hash, Utc::now().to_rfc3339()],
        )?;

        debug!("Wrote {} bytes to slot {}", value.len(), key);
        Ok(true)
    }

    /// Get statistics for the database and the slot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self, key: &str) -> Result<StorageStats> {
        let slot_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))?;

        let slot: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT length(CAST(value AS BLOB)), updated_at FROM slots WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (slot_bytes, last_saved) = match slot {
            Some((bytes, updated_at)) => (
                u64::try_from(bytes).unwrap_or(0),
                DateTime::parse_from_rfc3339(&updated_at)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            ),
            None => (0, None),
        };

        let db_size_bytes = if self.path.as_os_str() == IN_MEMORY_PATH {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            slot_count,
            slot_bytes,
            last_saved,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of slots in the database.
    pub slot_count: i64,
    /// Size of the requested slot's value in bytes.
    pub slot_bytes: u64,
    /// When the requested slot was last written.
    pub last_saved: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
