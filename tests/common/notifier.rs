//! Notifier under test, wired to a fake API and a temporary database.

use super::constants::*;
use super::server::FakeRequestApi;
use anyhow::Result;
use std::sync::{Arc, Mutex};
use supply_notifier::config::{AppConfig, CliConfig};
use supply_notifier::notifications::{AlertSink, LocalAlert};
use supply_notifier::{HttpRequestSource, Notifier, TickError, TickOutcome};
use tempfile::TempDir;

/// Alert sink that keeps every delivered alert for inspection.
#[derive(Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<LocalAlert>>,
}

impl RecordingAlertSink {
    #[allow(dead_code)]
    pub fn alerts(&self) -> Vec<LocalAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertSink for RecordingAlertSink {
    fn deliver(&self, alert: &LocalAlert) -> Result<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

pub struct TestNotifier {
    pub notifier: Notifier,
    pub alerts: Arc<RecordingAlertSink>,
    db_dir: TempDir,
    base_url: String,
}

impl TestNotifier {
    /// Notifier with a fresh database and nobody logged in.
    pub async fn spawn(api: &FakeRequestApi) -> Self {
        let db_dir = TempDir::new().expect("Failed to create temp dir");
        let alerts = Arc::new(RecordingAlertSink::default());
        let notifier = Self::open(db_dir.path(), &api.base_url, alerts.clone());
        Self {
            notifier,
            alerts,
            db_dir,
            base_url: api.base_url.clone(),
        }
    }

    /// Notifier with [`STUDENT_ID`] logged in.
    pub async fn logged_in(api: &FakeRequestApi) -> Self {
        let test_notifier = Self::spawn(api).await;
        test_notifier
            .notifier
            .login(STUDENT_ID)
            .expect("Failed to log in");
        test_notifier
    }

    fn open(
        db_dir: &std::path::Path,
        base_url: &str,
        alerts: Arc<RecordingAlertSink>,
    ) -> Notifier {
        let cli = CliConfig {
            db_dir: Some(db_dir.to_path_buf()),
            api_base_url: base_url.to_string(),
            http_timeout_sec: TEST_HTTP_TIMEOUT_SEC,
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, None).expect("Failed to resolve config");
        let source = Arc::new(
            HttpRequestSource::new(base_url, TEST_HTTP_TIMEOUT_SEC)
                .expect("Failed to build request source"),
        );
        Notifier::with_parts(config, source, alerts).expect("Failed to open notifier")
    }

    /// Close and reopen the notifier on the same database, as after a restart.
    #[allow(dead_code)]
    pub fn restart(self) -> Self {
        let Self {
            notifier,
            alerts,
            db_dir,
            base_url,
        } = self;
        drop(notifier);
        let notifier = Self::open(db_dir.path(), &base_url, alerts.clone());
        Self {
            notifier,
            alerts,
            db_dir,
            base_url,
        }
    }

    pub async fn poll(&self) -> Result<TickOutcome, TickError> {
        self.notifier.scheduler.poll_now().await
    }
}
