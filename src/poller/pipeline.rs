//! One reconcile cycle over the remote request list.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client_state::{IdentityProvider, SnapshotStore};
use crate::notifications::{classify, NotificationEmitter, ReminderEvaluator};
use crate::requests::{diff, RequestSource};

/// Result of one completed reconcile tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nobody is logged in; nothing was fetched or written.
    NoIdentity,
    Completed {
        /// Status changes detected against the last-known snapshot.
        transitions: usize,
        /// Transition notifications actually recorded.
        notified: usize,
        /// Reminders recorded.
        reminders: usize,
    },
}

/// Why a tick was abandoned. In both cases the last-known snapshot is left
/// untouched, so the next tick diffs against the same state.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("Fetch error: {0:#}")]
    Fetch(anyhow::Error),

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),
}

/// One fetch, diff, notify and persist cycle.
pub struct ReconcilePipeline {
    source: Arc<dyn RequestSource>,
    identity: Arc<dyn IdentityProvider>,
    snapshots: SnapshotStore,
    emitter: NotificationEmitter,
    reminders: ReminderEvaluator,
}

impl ReconcilePipeline {
    pub fn new(
        source: Arc<dyn RequestSource>,
        identity: Arc<dyn IdentityProvider>,
        snapshots: SnapshotStore,
        emitter: NotificationEmitter,
        reminders: ReminderEvaluator,
    ) -> Self {
        Self {
            source,
            identity,
            snapshots,
            emitter,
            reminders,
        }
    }

    /// Run one cycle. Callers must not run two ticks concurrently.
    pub async fn tick(&self) -> Result<TickOutcome, TickError> {
        let student_id = match self.identity.current_student_id().map_err(TickError::Storage)? {
            Some(id) => id,
            None => {
                debug!("No student logged in, skipping poll");
                return Ok(TickOutcome::NoIdentity);
            }
        };

        let mut current = self
            .source
            .fetch_snapshot(&student_id)
            .await
            .map_err(TickError::Fetch)?;
        let previous = self.snapshots.load().map_err(TickError::Storage)?;
        let carried = current.carry_over_unreadable(&previous);
        if carried > 0 {
            warn!(
                "Kept last-known state of {} malformed request entries",
                carried
            );
        }

        let transitions = diff(&current, &previous);
        let mut notified = 0;
        for transition in &transitions {
            debug!(
                "Request {} changed from {:?} to {:?}",
                transition.entry.request_id, transition.previous_status, transition.new_status
            );
            let Some(classified) = classify(transition) else {
                continue;
            };
            if self
                .emitter
                .emit(&classified)
                .map_err(TickError::Storage)?
                .is_some()
            {
                notified += 1;
            }
        }

        let reminders = self
            .reminders
            .remind(&current, Utc::now(), &self.emitter)
            .map_err(TickError::Storage)?
            .len();

        self.snapshots.save(&current).map_err(TickError::Storage)?;

        if notified > 0 || reminders > 0 {
            info!(
                "Poll for student {}: {} transitions, {} notifications, {} reminders",
                student_id,
                transitions.len(),
                notified,
                reminders
            );
        } else {
            debug!(
                "Poll for student {}: {} requests, {} transitions",
                student_id,
                current.len(),
                transitions.len()
            );
        }

        Ok(TickOutcome::Completed {
            transitions: transitions.len(),
            notified,
            reminders,
        })
    }
}
