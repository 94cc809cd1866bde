//! Snapshot differ.

use super::models::{status_eq, Snapshot, Transition};

/// Compare the current snapshot against the previously observed one.
///
/// Only status changes of requests present in both snapshots are reported.
/// Requests that appear for the first time or disappear are ignored.
pub fn diff(current: &Snapshot, previous: &Snapshot) -> Vec<Transition> {
    current
        .iter()
        .filter_map(|entry| {
            let before = previous.get(entry.request_id)?;
            if status_eq(&before.status, &entry.status) {
                return None;
            }
            Some(Transition {
                entry: entry.clone(),
                previous_status: before.status.clone(),
                new_status: entry.status.clone(),
            })
        })
        .collect()
}
