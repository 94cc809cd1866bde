use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::StateStore;
use crate::sqlite_persistence::{lock, SharedConnection};

/// [`StateStore`] over the `client_state` table.
#[derive(Clone)]
pub struct SqliteStateStore {
    conn: SharedConnection,
}

impl SqliteStateStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl StateStore for SqliteStateStore {
    fn get_state(&self, key: &str) -> Result<Option<String>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT value FROM client_state WHERE key = ?1")?;

        let value: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;

        Ok(value)
    }

    fn set_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = lock(&self.conn)?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO client_state (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, now],
        )?;

        Ok(())
    }

    fn delete_state(&self, key: &str) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute("DELETE FROM client_state WHERE key = ?1", params![key])?;
        Ok(())
    }
}
