//! Turns request events into recorded notifications and local alerts.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::alert::AlertSink;
use super::dedup::DedupGuard;
use super::models::{
    ClassifiedNotification, LocalAlert, Notification, NotificationKind, NotificationPayload,
};
use super::store::NotificationStore;
use crate::requests::{RequestSnapshotEntry, RequestStatus, Transition};

const APPROVED_TITLE: &str = "¡Solicitud Aprobada!";
const REJECTED_TITLE: &str = "Solicitud Rechazada";
const PENDING_TITLE: &str = "Solicitud en Revisión";
const REMINDER_TITLE: &str = "Recordatorio de Solicitud";

/// Short date shown in notification bodies.
fn format_start_date(entry: &RequestSnapshotEntry) -> String {
    entry.starts_at.format("%d/%m/%Y").to_string()
}

/// Map a status transition onto the notification it warrants, if any.
///
/// Only the new status matters. Unknown statuses produce nothing.
pub fn classify(transition: &Transition) -> Option<ClassifiedNotification> {
    let entry = &transition.entry;
    let subject = entry.subject_name.clone();

    let (title, body, payload) = match RequestStatus::parse(&transition.new_status) {
        RequestStatus::Approved => (
            APPROVED_TITLE,
            format!(
                "Tu solicitud para {} ha sido aprobada. Fecha: {}",
                subject,
                format_start_date(entry)
            ),
            NotificationPayload::RequestApproved {
                request_id: entry.request_id,
                subject_name: subject.clone(),
                starts_at: entry.starts_at,
            },
        ),
        RequestStatus::Rejected => {
            let mut body = format!("Tu solicitud para {} ha sido rechazada.", subject);
            if let Some(notes) = entry.notes.as_deref().filter(|n| !n.trim().is_empty()) {
                body.push_str(&format!(" Motivo: {}", notes));
            }
            (
                REJECTED_TITLE,
                body,
                NotificationPayload::RequestRejected {
                    request_id: entry.request_id,
                    subject_name: subject.clone(),
                    notes: entry.notes.clone(),
                },
            )
        }
        RequestStatus::Pending => (
            PENDING_TITLE,
            format!("Tu solicitud para {} está siendo revisada.", subject),
            NotificationPayload::RequestPending {
                request_id: entry.request_id,
                subject_name: subject.clone(),
            },
        ),
        RequestStatus::Unknown(status) => {
            debug!(
                "No notification for request {} entering status {:?}",
                entry.request_id, status
            );
            return None;
        }
    };

    Some(ClassifiedNotification {
        kind: payload.kind(),
        title: title.to_string(),
        body,
        payload,
        subject_name: subject,
        notes: entry.notes.clone(),
    })
}

/// Reminder for an approved request that starts soon.
pub fn classify_reminder(entry: &RequestSnapshotEntry) -> ClassifiedNotification {
    ClassifiedNotification {
        kind: NotificationKind::UpcomingReminder,
        title: REMINDER_TITLE.to_string(),
        body: format!(
            "Tu solicitud para {} comienza mañana. Prepárate para recoger los insumos.",
            entry.subject_name
        ),
        payload: NotificationPayload::UpcomingReminder {
            request_id: entry.request_id,
            subject_name: entry.subject_name.clone(),
            starts_at: entry.starts_at,
        },
        subject_name: entry.subject_name.clone(),
        notes: None,
    }
}

/// Records notifications and raises the matching local alert.
#[derive(Clone)]
pub struct NotificationEmitter {
    store: Arc<dyn NotificationStore>,
    guard: DedupGuard,
    alert_sink: Arc<dyn AlertSink>,
}

impl NotificationEmitter {
    pub fn new(store: Arc<dyn NotificationStore>, alert_sink: Arc<dyn AlertSink>) -> Self {
        Self {
            guard: DedupGuard::new(store.clone()),
            store,
            alert_sink,
        }
    }

    /// Emit a classified notification unless its (request id, kind) pair was
    /// already notified.
    ///
    /// Returns the recorded notification, or `None` when suppressed. A storage
    /// error is returned before any alert is raised. A failed alert is logged
    /// and the record is kept.
    pub fn emit(&self, classified: &ClassifiedNotification) -> Result<Option<Notification>> {
        let request_id = classified.payload.request_id();
        if !self.guard.should_notify(request_id, &classified.kind)? {
            debug!(
                "Suppressing duplicate {} notification for request {}",
                classified.kind, request_id
            );
            return Ok(None);
        }

        let recorded = self.store.append(classified.to_new_notification())?;
        info!(
            "Recorded {} notification {} for request {}",
            recorded.kind, recorded.id, request_id
        );

        let alert = LocalAlert {
            title: classified.title.clone(),
            body: classified.body.clone(),
            payload: classified.payload.clone(),
            sound: true,
        };
        if let Err(e) = self.alert_sink.deliver(&alert) {
            warn!(
                "Failed to deliver alert for notification {}: {}",
                recorded.id, e
            );
        }

        Ok(Some(recorded))
    }
}
