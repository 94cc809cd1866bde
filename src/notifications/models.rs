//! Notification data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::requests::RequestId;

/// Notification kind. The persisted strings are shared with the mobile client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum NotificationKind {
    RequestApproved,
    RequestRejected,
    RequestPending,
    UpcomingReminder,
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::RequestApproved => "solicitud_aprobada",
            NotificationKind::RequestRejected => "solicitud_rechazada",
            NotificationKind::RequestPending => "solicitud_pendiente",
            NotificationKind::UpcomingReminder => "recordatorio_solicitud",
            NotificationKind::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "solicitud_aprobada" => NotificationKind::RequestApproved,
            "solicitud_rechazada" => NotificationKind::RequestRejected,
            "solicitud_pendiente" => NotificationKind::RequestPending,
            "recordatorio_solicitud" => NotificationKind::UpcomingReminder,
            other => NotificationKind::Other(other.to_string()),
        }
    }

    /// Accent colour used by the notification list.
    pub fn color(&self) -> &'static str {
        match self {
            NotificationKind::RequestApproved => "#4caf50",
            NotificationKind::RequestRejected => "#e53935",
            NotificationKind::RequestPending => "#f5a623",
            NotificationKind::UpcomingReminder => "#2196f3",
            NotificationKind::Other(_) => "#666",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NotificationKind {
    fn from(s: String) -> Self {
        NotificationKind::parse(&s)
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A notification recorded in the local history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    /// Unix seconds.
    pub created_at: i64,
    pub is_read: bool,
    pub request_id: Option<RequestId>,
    pub subject_name: Option<String>,
    pub notes: Option<String>,
}

impl Notification {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }
}

/// Content of a notification about to be recorded. The store assigns id,
/// creation time and read state.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub request_id: Option<RequestId>,
    pub subject_name: Option<String>,
    pub notes: Option<String>,
}

/// Data attached to a platform alert, one shape per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationPayload {
    #[serde(rename = "solicitud_aprobada")]
    RequestApproved {
        request_id: RequestId,
        subject_name: String,
        starts_at: DateTime<Utc>,
    },
    #[serde(rename = "solicitud_rechazada")]
    RequestRejected {
        request_id: RequestId,
        subject_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    #[serde(rename = "solicitud_pendiente")]
    RequestPending {
        request_id: RequestId,
        subject_name: String,
    },
    #[serde(rename = "recordatorio_solicitud")]
    UpcomingReminder {
        request_id: RequestId,
        subject_name: String,
        starts_at: DateTime<Utc>,
    },
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::RequestApproved { .. } => NotificationKind::RequestApproved,
            NotificationPayload::RequestRejected { .. } => NotificationKind::RequestRejected,
            NotificationPayload::RequestPending { .. } => NotificationKind::RequestPending,
            NotificationPayload::UpcomingReminder { .. } => NotificationKind::UpcomingReminder,
        }
    }

    pub fn request_id(&self) -> RequestId {
        match self {
            NotificationPayload::RequestApproved { request_id, .. }
            | NotificationPayload::RequestRejected { request_id, .. }
            | NotificationPayload::RequestPending { request_id, .. }
            | NotificationPayload::UpcomingReminder { request_id, .. } => *request_id,
        }
    }
}

/// Everything the emitter produces for one event: the local alert and the
/// history record share title and body.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
    pub subject_name: String,
    pub notes: Option<String>,
}

impl ClassifiedNotification {
    pub fn to_new_notification(&self) -> NewNotification {
        NewNotification {
            title: self.title.clone(),
            message: self.body.clone(),
            kind: self.kind.clone(),
            request_id: Some(self.payload.request_id()),
            subject_name: Some(self.subject_name.clone()),
            notes: self.notes.clone(),
        }
    }
}

/// Platform-level local alert (sound plus visual).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalAlert {
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
    pub sound: bool,
}
