//! Shared constants for end-to-end tests
//!
//! When test data changes (student ids, subjects, timing), update only this file.

/// Student the fake API serves requests for
pub const STUDENT_ID: &str = "1001";

/// A second student with an independent request list
#[allow(dead_code)]
pub const OTHER_STUDENT_ID: &str = "2002";

/// Subject used by most fixtures
pub const SUBJECT_CHEMISTRY: &str = "Química General";

/// Subject used when a second request is needed
#[allow(dead_code)]
pub const SUBJECT_PHYSICS: &str = "Física I";

/// How long to wait for the fake API to accept connections
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// HTTP timeout used by the notifier under test
pub const TEST_HTTP_TIMEOUT_SEC: u64 = 2;
