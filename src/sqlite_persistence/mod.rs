//! SQLite persistence shared by the notification store and the client state store.

mod schema;
mod versioned_schema;

pub use schema::NOTIFIER_VERSIONED_SCHEMAS;
pub use versioned_schema::{Column, SqlType, Table, VersionedSchema, BASE_DB_VERSION};

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Connection handle shared between stores living in the same database file.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open (creating or migrating as needed) the notifier database at `db_path`.
pub fn open_database<P: AsRef<Path>>(db_path: P) -> Result<SharedConnection> {
    let path = db_path.as_ref();
    let is_new_db = !path.exists();

    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open notifier database at {:?}", path))?;

    if is_new_db {
        info!("Creating new notifier database at {:?}", path);
        latest_schema()?.create(&conn)?;
    } else {
        migrate_existing(&mut conn)?;
    }

    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database with the latest schema, used by tests and dry runs.
pub fn open_in_memory() -> Result<SharedConnection> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    latest_schema()?.create(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Lock a shared connection, turning mutex poisoning into an error.
pub fn lock(conn: &SharedConnection) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow::anyhow!("Notifier database connection lock poisoned"))
}

fn latest_schema() -> Result<&'static VersionedSchema> {
    NOTIFIER_VERSIONED_SCHEMAS
        .last()
        .context("No notifier schema versions defined")
}

fn migrate_existing(conn: &mut Connection) -> Result<()> {
    let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let db_version = raw_version - BASE_DB_VERSION as i64;
    if db_version < 1 {
        bail!(
            "Notifier database version {} is invalid (expected >= 1)",
            db_version
        );
    }

    let schema = NOTIFIER_VERSIONED_SCHEMAS
        .iter()
        .find(|s| s.version == db_version as usize)
        .with_context(|| format!("Unknown notifier database version {}", db_version))?;
    schema.validate(conn).with_context(|| {
        format!(
            "Notifier database schema validation failed for version {}",
            db_version
        )
    })?;

    let target = latest_schema()?.version;
    if schema.version == target {
        return Ok(());
    }

    info!(
        "Migrating notifier database from version {} to {}",
        schema.version, target
    );
    let tx = conn.transaction()?;
    for next in NOTIFIER_VERSIONED_SCHEMAS
        .iter()
        .filter(|s| s.version > schema.version)
    {
        if let Some(migration_fn) = next.migration {
            migration_fn(&tx)
                .with_context(|| format!("Failed to run migration to version {}", next.version))?;
        }
    }
    tx.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + target),
        [],
    )?;
    tx.commit()?;
    Ok(())
}
