//! Request payloads shaped like the real API's responses.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

/// A request starting a week from now, far outside the reminder window.
pub fn request_json(request_id: i64, status: &str, subject: &str) -> Value {
    request_json_starting_at(request_id, status, subject, Utc::now() + Duration::days(7))
}

pub fn request_json_starting_at(
    request_id: i64,
    status: &str,
    subject: &str,
    starts_at: DateTime<Utc>,
) -> Value {
    json!({
        "id_solicitud": request_id,
        "estado": status,
        "materia_nombre": subject,
        "fecha_hora_inicio": starts_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "fecha_hora_fin": (starts_at + Duration::hours(2)).to_rfc3339_opts(SecondsFormat::Millis, true),
        "observaciones": null,
    })
}

#[allow(dead_code)]
pub fn rejected_request_json(request_id: i64, subject: &str, reason: &str) -> Value {
    let mut value = request_json(request_id, "Rechazada", subject);
    value["observaciones"] = json!(reason);
    value
}
