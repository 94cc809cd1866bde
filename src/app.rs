//! Wiring of stores, identity, pipeline and scheduler for one database.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client_state::{
    IdentityProvider, SnapshotStore, SqliteStateStore, StateStore, StaticIdentity,
    StoredIdentity,
};
use crate::config::AppConfig;
use crate::notifications::{
    AlertSink, BadgeCounter, LogAlertSink, NotificationEmitter, NotificationStore,
    ReminderEvaluator, SqliteNotificationStore,
};
use crate::poller::{spawn_badge_refresh, spawn_retention_pruning, PollScheduler, ReconcilePipeline};
use crate::requests::{HttpRequestSource, RequestSource};
use crate::sqlite_persistence::open_database;

/// Every long-lived component of the notifier.
pub struct Notifier {
    pub config: AppConfig,
    pub notifications: Arc<dyn NotificationStore>,
    pub snapshots: SnapshotStore,
    pub stored_identity: StoredIdentity,
    pub badge: Arc<BadgeCounter>,
    pub scheduler: PollScheduler,
}

impl Notifier {
    /// Open the database in `config.db_dir` and poll the configured HTTP API.
    pub fn open(config: AppConfig) -> Result<Self> {
        let source = Arc::new(HttpRequestSource::new(
            &config.api_base_url,
            config.http_timeout_sec,
        )?);
        Self::with_parts(config, source, Arc::new(LogAlertSink))
    }

    pub fn with_parts(
        config: AppConfig,
        source: Arc<dyn RequestSource>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> Result<Self> {
        let db_path = config.notifier_db_path();
        info!("Opening notifier database at {:?}...", db_path);
        let conn = open_database(&db_path)?;

        let notifications: Arc<dyn NotificationStore> = Arc::new(SqliteNotificationStore::new(
            conn.clone(),
            config.notifications.max_notifications,
        ));
        let state: Arc<dyn StateStore> = Arc::new(SqliteStateStore::new(conn));
        let snapshots = SnapshotStore::new(state.clone());
        let stored_identity = StoredIdentity::new(state);

        let identity: Arc<dyn IdentityProvider> = match &config.student_id {
            Some(student_id) => {
                info!("Polling on behalf of configured student {}", student_id);
                Arc::new(StaticIdentity::new(Some(student_id.clone())))
            }
            None => Arc::new(stored_identity.clone()),
        };

        let pipeline = ReconcilePipeline::new(
            source,
            identity,
            snapshots.clone(),
            NotificationEmitter::new(notifications.clone(), alert_sink),
            ReminderEvaluator::from_hours(config.notifications.reminder_window_hours),
        );
        let scheduler = PollScheduler::new(Arc::new(pipeline), config.poll_interval());
        let badge = Arc::new(BadgeCounter::new(notifications.clone()));

        Ok(Self {
            config,
            notifications,
            snapshots,
            stored_identity,
            badge,
            scheduler,
        })
    }

    /// Log in as `student_id`. The last-known snapshot belongs to the previous
    /// student, so it is dropped.
    pub fn login(&self, student_id: &str) -> Result<()> {
        self.stored_identity.login(student_id)?;
        self.snapshots.clear()
    }

    pub fn logout(&self) -> Result<()> {
        self.stored_identity.logout()?;
        self.snapshots.clear()
    }

    /// Start polling plus the badge and pruning tasks, all tied to `cancel`.
    pub async fn start_background(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        self.scheduler.start().await;

        let mut handles = vec![spawn_badge_refresh(
            self.badge.clone(),
            self.config.badge_refresh_interval(),
            cancel.clone(),
        )];
        if let Some(handle) = spawn_retention_pruning(
            self.notifications.clone(),
            self.config.notifications.retention_days,
            self.config.prune_interval(),
            cancel,
        ) {
            handles.push(handle);
        }
        handles
    }
}
