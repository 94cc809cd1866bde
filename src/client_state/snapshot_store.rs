use anyhow::{Context, Result};
use std::sync::Arc;

use super::StateStore;
use crate::requests::Snapshot;

pub const LAST_SNAPSHOT_KEY: &str = "last_snapshot";

/// Persists the last successfully fetched snapshot between polls and restarts.
#[derive(Clone)]
pub struct SnapshotStore {
    state: Arc<dyn StateStore>,
}

impl SnapshotStore {
    pub fn new(state: Arc<dyn StateStore>) -> Self {
        Self { state }
    }

    /// Last-known snapshot, or the empty snapshot on first run.
    pub fn load(&self) -> Result<Snapshot> {
        match self.state.get_state(LAST_SNAPSHOT_KEY)? {
            Some(json) => serde_json::from_str(&json).context("Failed to decode stored snapshot"),
            None => Ok(Snapshot::empty()),
        }
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.state.set_state(LAST_SNAPSHOT_KEY, &json)
    }

    /// Forget the last-known snapshot, e.g. when the logged-in student changes.
    pub fn clear(&self) -> Result<()> {
        self.state.delete_state(LAST_SNAPSHOT_KEY)
    }
}
