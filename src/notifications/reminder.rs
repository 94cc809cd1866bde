//! Reminders for approved requests that start soon.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use super::emitter::{classify_reminder, NotificationEmitter};
use super::models::Notification;
use crate::requests::{RequestSnapshotEntry, RequestStatus, Snapshot};

pub struct ReminderEvaluator {
    window: Duration,
}

impl ReminderEvaluator {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn from_hours(hours: u32) -> Self {
        Self::new(Duration::hours(i64::from(hours)))
    }

    /// Approved entries starting within `(now, now + window]`.
    pub fn evaluate<'a>(
        &self,
        snapshot: &'a Snapshot,
        now: DateTime<Utc>,
    ) -> Vec<&'a RequestSnapshotEntry> {
        snapshot
            .iter()
            .filter(|entry| entry.status() == RequestStatus::Approved)
            .filter(|entry| {
                let until_start = entry.starts_at - now;
                until_start > Duration::zero() && until_start <= self.window
            })
            .collect()
    }

    /// Emit a reminder for every candidate not reminded before.
    pub fn remind(
        &self,
        snapshot: &Snapshot,
        now: DateTime<Utc>,
        emitter: &NotificationEmitter,
    ) -> Result<Vec<Notification>> {
        let mut emitted = Vec::new();
        for entry in self.evaluate(snapshot, now) {
            if let Some(notification) = emitter.emit(&classify_reminder(entry))? {
                emitted.push(notification);
            }
        }
        Ok(emitted)
    }
}
