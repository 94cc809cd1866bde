//! SQLite-backed notification history.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::models::{NewNotification, Notification, NotificationKind};
use super::store::NotificationStore;
use crate::requests::RequestId;
use crate::sqlite_persistence::{lock, SharedConnection};

const UNREAD_COUNT_KEY: &str = "unread_count";
const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

const SELECT_COLUMNS: &str =
    "id, title, message, kind, created_at, is_read, request_id, subject_name, notes";

/// Notification history stored in the notifier database.
#[derive(Clone)]
pub struct SqliteNotificationStore {
    conn: SharedConnection,
    /// Maximum number of notifications kept; 0 disables the cap.
    max_notifications: usize,
}

impl SqliteNotificationStore {
    pub fn new(conn: SharedConnection, max_notifications: usize) -> Self {
        Self {
            conn,
            max_notifications,
        }
    }

    /// Record a notification with an explicit creation time.
    pub fn append_at(
        &self,
        notification: NewNotification,
        created_at: DateTime<Utc>,
    ) -> Result<Notification> {
        let record = Notification {
            id: generate_notification_id(created_at),
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            created_at: created_at.timestamp(),
            is_read: false,
            request_id: notification.request_id,
            subject_name: notification.subject_name,
            notes: notification.notes,
        };

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO notifications
                (id, title, message, kind, created_at, is_read, request_id, subject_name, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8)",
            params![
                record.id,
                record.title,
                record.message,
                record.kind.as_str(),
                record.created_at,
                record.request_id,
                record.subject_name,
                record.notes,
            ],
        )
        .with_context(|| {
            format!(
                "Failed to insert {} notification for request {:?}",
                record.kind, record.request_id
            )
        })?;

        if self.max_notifications > 0 {
            let dropped = tx.execute(
                "DELETE FROM notifications WHERE seq NOT IN
                    (SELECT seq FROM notifications ORDER BY seq DESC LIMIT ?1)",
                params![self.max_notifications as i64],
            )?;
            if dropped > 0 {
                debug!("Dropped {} notifications beyond history cap", dropped);
            }
        }

        refresh_unread_count(&tx)?;
        tx.commit()?;

        Ok(record)
    }

    /// Remove notifications created before `now - days`.
    pub fn prune_older_than_at(&self, days: u32, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = (now - Duration::days(i64::from(days))).timestamp();
        let removed = self.mutate(|conn| {
            Ok(conn.execute(
                "DELETE FROM notifications WHERE created_at < ?1",
                params![cutoff],
            )?)
        })?;
        if removed > 0 {
            info!(
                "Pruned {} notifications older than {} days",
                removed, days
            );
        }
        Ok(removed)
    }

    /// Run a write and the unread counter refresh in one transaction.
    fn mutate<T>(&self, write: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let result = write(&*tx)?;
        refresh_unread_count(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    fn query(&self, where_clause: &str, args: impl rusqlite::Params) -> Result<Vec<Notification>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notifications {} ORDER BY seq DESC",
            SELECT_COLUMNS, where_clause
        ))?;
        let notifications = stmt
            .query_map(args, row_to_notification)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notifications)
    }
}

impl NotificationStore for SqliteNotificationStore {
    fn append(&self, notification: NewNotification) -> Result<Notification> {
        self.append_at(notification, Utc::now())
    }

    fn get_all(&self) -> Result<Vec<Notification>> {
        self.query("", [])
    }

    fn get_unread(&self) -> Result<Vec<Notification>> {
        self.query("WHERE is_read = 0", [])
    }

    fn get(&self, id: &str) -> Result<Option<Notification>> {
        let conn = lock(&self.conn)?;
        let notification = conn
            .query_row(
                &format!("SELECT {} FROM notifications WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                row_to_notification,
            )
            .optional()?;
        Ok(notification)
    }

    fn exists(&self, request_id: RequestId, kind: &NotificationKind) -> Result<bool> {
        let conn = lock(&self.conn)?;
        let found = conn
            .query_row(
                "SELECT 1 FROM notifications WHERE request_id = ?1 AND kind = ?2 LIMIT 1",
                params![request_id, kind.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn mark_read(&self, id: &str) -> Result<bool> {
        let changed = self.mutate(|conn| {
            Ok(conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1",
                params![id],
            )?)
        })?;
        Ok(changed > 0)
    }

    fn mark_all_read(&self) -> Result<usize> {
        self.mutate(|conn| {
            Ok(conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE is_read = 0",
                [],
            )?)
        })
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.mutate(|conn| {
            Ok(conn.execute("DELETE FROM notifications WHERE id = ?1", params![id])?)
        })?;
        Ok(removed > 0)
    }

    fn clear_all(&self) -> Result<usize> {
        self.mutate(|conn| Ok(conn.execute("DELETE FROM notifications", [])?))
    }

    fn prune_older_than(&self, days: u32) -> Result<usize> {
        self.prune_older_than_at(days, Utc::now())
    }

    fn get_unread_count(&self) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let count: Option<i64> = conn
            .query_row(
                "SELECT value FROM notification_meta WHERE key = ?1",
                params![UNREAD_COUNT_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0).max(0) as usize)
    }

    fn count(&self) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notifications", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}

fn refresh_unread_count(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO notification_meta (key, value)
         VALUES (?1, (SELECT COUNT(*) FROM notifications WHERE is_read = 0))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![UNREAD_COUNT_KEY],
    )?;
    Ok(())
}

fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
    let kind: String = row.get("kind")?;
    Ok(Notification {
        id: row.get("id")?,
        title: row.get("title")?,
        message: row.get("message")?,
        kind: NotificationKind::parse(&kind),
        created_at: row.get("created_at")?,
        is_read: row.get::<_, i64>("is_read")? != 0,
        request_id: row.get("request_id")?,
        subject_name: row.get("subject_name")?,
        notes: row.get("notes")?,
    })
}

/// Millisecond timestamp followed by a random base36 suffix.
fn generate_notification_id(created_at: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_SUFFIX_ALPHABET[rng.random_range(0..ID_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", created_at.timestamp_millis(), suffix)
}
