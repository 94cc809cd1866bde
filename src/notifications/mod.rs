//! Notification history, deduplication and delivery.

mod alert;
mod badge;
mod dedup;
mod emitter;
mod models;
mod reminder;
mod sqlite_store;
mod store;

pub use alert::{AlertSink, LogAlertSink};
pub use badge::{badge_label, BadgeCounter, BADGE_MAX_COUNT};
pub use dedup::DedupGuard;
pub use emitter::{classify, classify_reminder, NotificationEmitter};
pub use models::{
    ClassifiedNotification, LocalAlert, NewNotification, Notification, NotificationKind,
    NotificationPayload,
};
pub use reminder::ReminderEvaluator;
pub use sqlite_store::SqliteNotificationStore;
pub use store::NotificationStore;
