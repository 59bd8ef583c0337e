//! Schema versioning for the shared store
//!
//! Each step runs in its own transaction together with its
//! `schema_migrations` row, so a crash mid-upgrade leaves a consistent
//! version behind.

use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};

use crate::error::Result;

/// One schema step
pub struct Migration {
    /// Sequential, starting from 1
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Local storage items",
        sql: r#"
            -- Raw JSON text per key
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Change log for cross-context notifications",
        sql: r#"
            -- Appended on every set/remove; readers poll by revision
            CREATE TABLE IF NOT EXISTS storage_changes (
                revision INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                writer TEXT NOT NULL,
                changed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_storage_changes_writer ON storage_changes(writer);
        "#,
    },
];

/// Highest applied version, 0 for a fresh file
pub(crate) fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Bring the schema up to the newest version
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;

    let from = get_current_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        debug!(version = from, "Storage schema is current");
        return Ok(());
    }

    for migration in pending {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        conn.execute_batch("BEGIN IMMEDIATE")?;
        let applied = conn.execute_batch(migration.sql).and_then(|()| {
            conn.execute(
                "INSERT OR IGNORE INTO schema_migrations (version, description, applied_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    migration.version,
                    migration.description,
                    chrono::Utc::now().to_rfc3339()
                ],
            )
        });
        match applied {
            Ok(_) => conn.execute_batch("COMMIT")?,
            Err(e) => {
                conn.execute_batch("ROLLBACK")?;
                return Err(e.into());
            }
        }
    }

    info!(from, to = get_current_version(conn)?, "Storage schema updated");
    Ok(())
}
