//! Supply requests as observed from the remote API.

mod client;
mod differ;
mod models;

pub use client::{HttpRequestSource, RequestSource};
pub use differ::diff;
pub use models::{
    parse_api_timestamp, status_eq, RequestId, RequestSnapshotEntry, RequestStatus, Snapshot,
    Transition,
};
