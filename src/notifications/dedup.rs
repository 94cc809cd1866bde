//! At-most-once guard keyed on (request id, kind).

use anyhow::Result;
use std::sync::Arc;

use super::models::NotificationKind;
use super::store::NotificationStore;
use crate::requests::RequestId;

/// Consults the notification history before anything is emitted.
///
/// Read failures are returned to the caller instead of being turned into a
/// yes or a no: the caller aborts its cycle and retries on the next poll.
#[derive(Clone)]
pub struct DedupGuard {
    store: Arc<dyn NotificationStore>,
}

impl DedupGuard {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub fn should_notify(&self, request_id: RequestId, kind: &NotificationKind) -> Result<bool> {
        Ok(!self.store.exists(request_id, kind)?)
    }
}
