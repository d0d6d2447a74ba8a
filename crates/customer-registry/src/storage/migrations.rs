//! Schema versioning for the registry database.
//!
//! The version lives in the `metadata` table. Each step in [`MIGRATIONS`]
//! runs in its own transaction together with the version bump, so a failed
//! step leaves the database at the previous version.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// Metadata key holding the schema version.
const VERSION_KEY: &str = "schema_version";

/// One schema step: the version it produces and the SQL that gets there.
#[derive(Debug)]
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

/// Ordered schema steps. Version 1 is the base schema from
/// [`SCHEMA_STATEMENTS`] and needs no extra SQL.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "base slots and metadata tables",
    sql: "",
}];

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 1;

/// Create the tables if needed and bring the schema up to
/// [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if the stored version is unreadable or newer than this
/// build understands, or if a step fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let stored = schema_version(conn)?;
    if stored > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {stored} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > stored) {
        apply(conn, migration)?;
    }
    Ok(())
}

/// Stored schema version; 0 for a database that has none yet.
fn schema_version(conn: &Connection) -> Result<i32> {
    let stored: Option<String> = match conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    ) {
        Ok(value) => Some(value),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(e.into()),
    };

    stored.map_or(Ok(0), |value| {
        value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        })
    })
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    if !migration.sql.is_empty() {
        tx.execute_batch(migration.sql)
            .map_err(|e| Error::DatabaseMigration {
                message: format!("migration to version {} failed: {e}", migration.version),
            })?;
    }
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, migration.version.to_string()),
    )?;
    tx.commit()?;
    info!(
        version = migration.version,
        "Applied schema migration: {}", migration.description
    );
    Ok(())
}
