//! Notification storage trait

use anyhow::Result;

use super::models::{NewNotification, Notification, NotificationKind};
use crate::requests::RequestId;

/// Durable notification history.
///
/// Every mutating operation refreshes the cached unread counter as part of the
/// same write, so [`NotificationStore::get_unread_count`] never has to scan.
pub trait NotificationStore: Send + Sync {
    /// Record a notification at the head of the history.
    /// Assigns id and creation time, and stores it as unread.
    /// Drops the oldest entries beyond the configured history cap.
    fn append(&self, notification: NewNotification) -> Result<Notification>;

    /// All notifications, newest first.
    fn get_all(&self) -> Result<Vec<Notification>>;

    /// Unread notifications, newest first.
    fn get_unread(&self) -> Result<Vec<Notification>>;

    fn get(&self, id: &str) -> Result<Option<Notification>>;

    /// Whether a notification of `kind` already exists for `request_id`.
    fn exists(&self, request_id: RequestId, kind: &NotificationKind) -> Result<bool>;

    /// Mark one notification as read. Returns false if no such notification exists.
    fn mark_read(&self, id: &str) -> Result<bool>;

    /// Mark every notification as read. Returns how many changed.
    fn mark_all_read(&self) -> Result<usize>;

    /// Returns false if no such notification exists.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Remove the whole history. Returns how many were removed.
    fn clear_all(&self) -> Result<usize>;

    /// Remove notifications created more than `days` days ago.
    fn prune_older_than(&self, days: u32) -> Result<usize>;

    /// Cached unread counter.
    fn get_unread_count(&self) -> Result<usize>;

    fn count(&self) -> Result<usize>;
}
