//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{request_json, FakeRequestApi, TestNotifier, STUDENT_ID};
//!
//! #[tokio::test]
//! async fn test_first_poll() {
//!     let api = FakeRequestApi::spawn().await;
//!     api.set_requests(STUDENT_ID, vec![request_json(1, "Pendiente", "Química")]);
//!
//!     let notifier = TestNotifier::logged_in(&api).await;
//!     notifier.poll().await.unwrap();
//! }
//! ```

mod constants;
mod fixtures;
mod notifier;
mod server;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{request_json, request_json_starting_at, rejected_request_json};
pub use notifier::{RecordingAlertSink, TestNotifier};
pub use server::FakeRequestApi;
