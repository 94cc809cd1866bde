//! SQLite schema definitions for the notifier database.
//!
//! One database file holds the notification history, its cached unread
//! counter and the small key-value table used for client state (last observed
//! snapshot, logged-in student).

use super::{Column, SqlType, Table, VersionedSchema};
use crate::sqlite_column;

// =============================================================================
// Version 1 - Notification history and client state
// =============================================================================

/// Notification history. `seq` gives the insertion order (newest = highest).
const NOTIFICATIONS_TABLE_V1: Table = Table {
    name: "notifications",
    columns: &[
        sqlite_column!("seq", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("message", &SqlType::Text, non_null = true),
        sqlite_column!("kind", &SqlType::Text, non_null = true),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "is_read",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("request_id", &SqlType::Integer),
        sqlite_column!("subject_name", &SqlType::Text),
        sqlite_column!("notes", &SqlType::Text),
    ],
    indices: &[
        ("idx_notifications_created_at", "created_at"),
        ("idx_notifications_is_read", "is_read"),
    ],
    unique_constraints: &[&["id"], &["request_id", "kind"]],
};

/// Derived counters kept in sync with `notifications` inside the same transaction.
const NOTIFICATION_META_TABLE_V1: Table = Table {
    name: "notification_meta",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

/// Key-value client state.
const CLIENT_STATE_TABLE_V1: Table = Table {
    name: "client_state",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Text, non_null = true),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("(cast(strftime('%s','now') as int))")
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const NOTIFIER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        NOTIFICATIONS_TABLE_V1,
        NOTIFICATION_META_TABLE_V1,
        CLIENT_STATE_TABLE_V1,
    ],
    migration: None,
}];
