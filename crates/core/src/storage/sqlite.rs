//! SQLite-backed local storage
//!
//! A database file shared by several processes stands in for one browser
//! profile. Each opened backend is a context with its own writer id; every
//! write is appended to a change log so that other contexts can discover it
//! with [`SqliteBackend::changes_since`] and raise native notifications.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::storage::migrations;
use crate::storage::StorageBackend;

/// Change log rows kept behind the newest revision
const CHANGE_LOG_RETAINED: i64 = 1024;

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// A write made by some other context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub revision: i64,
    pub key: String,
}

/// One context's connection to the shared database
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
    writer: String,
}

impl SqliteBackend {
    /// Open or create the shared database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init(conn)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            writer: Uuid::new_v4().simple().to_string(),
        })
    }

    /// A second context on the same connection, with its own writer id
    pub fn new_context(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            writer: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        migrations::get_current_version(&self.lock()).unwrap_or(0)
    }

    /// Newest revision in the change log (0 when empty)
    pub fn latest_revision(&self) -> Result<i64> {
        let rev: Option<i64> = self.lock().query_row(
            "SELECT MAX(revision) FROM storage_changes",
            [],
            |row| row.get(0),
        )?;
        Ok(rev.unwrap_or(0))
    }

    /// Writes by other contexts after `revision`, oldest first
    pub fn changes_since(&self, revision: i64) -> Result<Vec<StorageChange>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT revision, key FROM storage_changes
             WHERE revision > ?1 AND writer != ?2
             ORDER BY revision ASC",
        )?;
        let rows = stmt.query_map(params![revision, self.writer], |row| {
            Ok(StorageChange {
                revision: row.get(0)?,
                key: row.get(1)?,
            })
        })?;
        let changes = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(changes)
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        match value {
            Some(value) => {
                tx.execute(
                    "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
                    params![key, value, now],
                )?;
            }
            None => {
                tx.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
            }
        }
        tx.execute(
            "INSERT INTO storage_changes (key, writer, changed_at) VALUES (?1, ?2, ?3)",
            params![key, self.writer, now],
        )?;
        let revision = tx.last_insert_rowid();
        tx.execute(
            "DELETE FROM storage_changes WHERE revision <= ?1",
            params![revision - CHANGE_LOG_RETAINED],
        )?;
        tx.commit()?;
        debug!(key, revision, writer = %self.writer, "SQLite storage write");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for SqliteBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .lock()
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, Some(value))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.write(key, None)
    }
}
