//! Local client state: last-known snapshot and logged-in identity.

mod identity;
mod snapshot_store;
mod sqlite_state_store;

pub use identity::{IdentityProvider, StaticIdentity, StoredIdentity, STUDENT_ID_KEY};
pub use snapshot_store::{SnapshotStore, LAST_SNAPSHOT_KEY};
pub use sqlite_state_store::SqliteStateStore;

use anyhow::Result;

/// Durable key-value storage for client state.
pub trait StateStore: Send + Sync {
    fn get_state(&self, key: &str) -> Result<Option<String>>;
    fn set_state(&self, key: &str, value: &str) -> Result<()>;
    fn delete_state(&self, key: &str) -> Result<()>;
}
