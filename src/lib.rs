//! Supply request notifier library.
//!
//! Polls a student's supply requests, turns status changes into local
//! notifications exactly once, and keeps a durable notification history.

pub mod app;
pub mod client_state;
pub mod config;
pub mod notifications;
pub mod poller;
pub mod requests;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use app::Notifier;
pub use notifications::{Notification, NotificationKind, NotificationStore};
pub use poller::{PollScheduler, TickError, TickOutcome};
pub use requests::{HttpRequestSource, RequestSource, Snapshot};
