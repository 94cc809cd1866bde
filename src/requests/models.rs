//! Supply request snapshot models.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Identifier assigned by the remote API to a supply request.
pub type RequestId = i64;

/// Status of a supply request as understood by the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    /// Any status word the notifier does not know, lowercased.
    Unknown(String),
}

impl RequestStatus {
    /// Parse a status word case-insensitively. Both the Spanish words used by the
    /// API and their English equivalents are accepted.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "pendiente" | "pending" => RequestStatus::Pending,
            "aprobada" | "aprobado" | "approved" => RequestStatus::Approved,
            "rechazada" | "rechazado" | "rejected" => RequestStatus::Rejected,
            _ => RequestStatus::Unknown(normalized),
        }
    }
}

/// Immutable view of one supply request at poll time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshotEntry {
    pub request_id: RequestId,
    pub subject_name: String,
    /// Status exactly as returned by the API. Compare through [`status_eq`].
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Reviewer remarks (`observaciones`), used as the rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RequestSnapshotEntry {
    pub fn status(&self) -> RequestStatus {
        RequestStatus::parse(&self.status)
    }

    /// Map one element of the API response onto an entry.
    ///
    /// Fails if any required field is missing or malformed; callers skip such
    /// elements rather than rejecting the whole response.
    pub fn from_api_value(value: &Value) -> Result<Self> {
        let object = value.as_object().context("entry is not a JSON object")?;

        let request_id = parse_request_id(object)?;
        let status = required_str(object, "estado")?;
        let subject_name = required_str(object, "materia_nombre")?;
        let starts_at = parse_api_timestamp(&required_str(object, "fecha_hora_inicio")?)?;
        let ends_at = optional_str(object, "fecha_hora_fin").and_then(|raw| {
            match parse_api_timestamp(&raw) {
                Ok(ends_at) => Some(ends_at),
                Err(e) => {
                    warn!("Ignoring end date of request {}: {}", request_id, e);
                    None
                }
            }
        });
        let notes = optional_str(object, "observaciones");

        Ok(Self {
            request_id,
            subject_name,
            status,
            starts_at,
            ends_at,
            notes,
        })
    }
}

fn parse_request_id(object: &serde_json::Map<String, Value>) -> Result<RequestId> {
    match object.get("id_solicitud") {
        Some(Value::Number(n)) => n.as_i64().context("id_solicitud is not an integer"),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("id_solicitud {:?} is not an integer", s)),
        Some(other) => bail!("id_solicitud has unexpected type: {}", other),
        None => bail!("missing id_solicitud"),
    }
}

fn required_str(object: &serde_json::Map<String, Value>, key: &str) -> Result<String> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => bail!("missing {}", key),
        Some(other) => bail!("{} has unexpected type: {}", key, other),
    }
}

fn optional_str(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse the timestamp formats the API is known to emit. Naive values are UTC.
pub fn parse_api_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .with_context(|| format!("unrecognized timestamp {:?}", raw))
}

/// Case-insensitive status comparison. The API does not normalize case.
pub fn status_eq(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// The full set of a student's requests as observed at one poll, keyed by request id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: Vec<RequestSnapshotEntry>,
    /// Ids of elements that were skipped as malformed. Never persisted.
    #[serde(skip)]
    unreadable: Vec<RequestId>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot, keeping the first entry for any repeated request id.
    pub fn from_entries(entries: impl IntoIterator<Item = RequestSnapshotEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for entry in entries {
            if seen.insert(entry.request_id) {
                kept.push(entry);
            } else {
                warn!(
                    "Dropping duplicate entry for request {} from snapshot",
                    entry.request_id
                );
            }
        }
        Self {
            entries: kept,
            unreadable: Vec::new(),
        }
    }

    /// Map an API response body onto a snapshot, skipping malformed elements.
    ///
    /// The id of a skipped element is remembered when it can still be read, see
    /// [`Snapshot::carry_over_unreadable`].
    pub fn from_api_values(values: &[Value]) -> Self {
        let mut unreadable = Vec::new();
        let entries: Vec<_> = values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| match RequestSnapshotEntry::from_api_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed request entry at index {}: {}", index, e);
                    if let Some(request_id) =
                        value.as_object().and_then(|o| parse_request_id(o).ok())
                    {
                        unreadable.push(request_id);
                    }
                    None
                }
            })
            .collect();

        let mut snapshot = Self::from_entries(entries);
        snapshot.unreadable = unreadable;
        snapshot
    }

    /// Ids of malformed elements not yet resolved against a previous snapshot.
    pub fn unreadable_ids(&self) -> &[RequestId] {
        &self.unreadable
    }

    /// Keep the last-known entry of every request whose element was malformed in
    /// this response, so its state is neither lost nor diffed as a new request.
    /// Returns how many entries were carried over.
    pub fn carry_over_unreadable(&mut self, previous: &Snapshot) -> usize {
        let mut carried = 0;
        for request_id in std::mem::take(&mut self.unreadable) {
            if self.get(request_id).is_some() {
                continue;
            }
            if let Some(entry) = previous.get(request_id) {
                self.entries.push(entry.clone());
                carried += 1;
            }
        }
        carried
    }

    pub fn get(&self, request_id: RequestId) -> Option<&RequestSnapshotEntry> {
        self.entries.iter().find(|e| e.request_id == request_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestSnapshotEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A detected status change between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The entry as found in the current snapshot.
    pub entry: RequestSnapshotEntry,
    pub previous_status: String,
    pub new_status: String,
}
