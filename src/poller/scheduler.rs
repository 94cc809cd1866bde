//! Periodic scheduling of reconcile ticks.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::pipeline::{ReconcilePipeline, TickError, TickOutcome};

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives [`ReconcilePipeline`] on a fixed period.
///
/// Idle until [`PollScheduler::start`], then runs one tick immediately and one
/// per period until [`PollScheduler::stop`]. Timer ticks and
/// [`PollScheduler::poll_now`] share one lock, so at most one tick is ever in
/// flight. A tick that outlives the period makes the timer skip, not queue.
pub struct PollScheduler {
    pipeline: Arc<ReconcilePipeline>,
    period: Duration,
    tick_lock: Arc<Mutex<()>>,
    running: Mutex<Option<RunningLoop>>,
}

impl PollScheduler {
    pub fn new(pipeline: Arc<ReconcilePipeline>, period: Duration) -> Self {
        Self {
            pipeline,
            period,
            tick_lock: Arc::new(Mutex::new(())),
            running: Mutex::new(None),
        }
    }

    /// Start polling. Returns false if already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            if !current.handle.is_finished() {
                debug!("Poll scheduler already running");
                return false;
            }
        }

        info!("Starting poll scheduler, period {:?}", self.period);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.pipeline.clone(),
            self.tick_lock.clone(),
            self.period,
            cancel.clone(),
        ));
        *running = Some(RunningLoop { cancel, handle });
        true
    }

    /// Stop polling, letting an in-flight tick finish. Returns false if not running.
    pub async fn stop(&self) -> bool {
        let Some(current) = self.running.lock().await.take() else {
            return false;
        };

        current.cancel.cancel();
        if let Err(e) = current.handle.await {
            error!("Poll loop terminated abnormally: {}", e);
        }
        info!("Poll scheduler stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|current| !current.handle.is_finished())
    }

    /// Run one tick right away, waiting for any in-flight tick first.
    pub async fn poll_now(&self) -> Result<TickOutcome, TickError> {
        let _guard = self.tick_lock.lock().await;
        self.pipeline.tick().await
    }
}

async fn poll_loop(
    pipeline: Arc<ReconcilePipeline>,
    tick_lock: Arc<Mutex<()>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // The tick itself is not raced against cancellation: stop() drains it.
        let _guard = tick_lock.lock().await;
        if cancel.is_cancelled() {
            break;
        }
        match pipeline.tick().await {
            Ok(_) => {}
            Err(TickError::Fetch(e)) => {
                warn!("Skipping poll, could not fetch requests: {:#}", e);
            }
            Err(TickError::Storage(e)) => {
                error!("Poll aborted on storage failure: {:#}", e);
            }
        }
    }

    debug!("Poll loop exited");
}

#[cfg(test)]
mod tests {
    use super::super::pipeline::test_support::ScriptedSource;
    use super::*;
    use crate::client_state::{SnapshotStore, SqliteStateStore, StateStore, StaticIdentity};
    use crate::notifications::{
        LogAlertSink, NotificationEmitter, NotificationStore, ReminderEvaluator,
        SqliteNotificationStore,
    };
    use crate::requests::{RequestSnapshotEntry, RequestSource, Snapshot};
    use crate::sqlite_persistence::open_in_memory;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(status: &str) -> Snapshot {
        Snapshot::from_entries(vec![RequestSnapshotEntry {
            request_id: 1,
            subject_name: "Física".to_string(),
            status: status.to_string(),
            starts_at: Utc::now() + chrono::Duration::days(10),
            ends_at: None,
            notes: None,
        }])
    }

    fn scheduler_with_source(
        source: Arc<dyn RequestSource>,
        period: Duration,
    ) -> (PollScheduler, Arc<SqliteNotificationStore>) {
        let conn = open_in_memory().unwrap();
        let notifications = Arc::new(SqliteNotificationStore::new(conn.clone(), 100));
        let state: Arc<dyn StateStore> = Arc::new(SqliteStateStore::new(conn));
        let pipeline = ReconcilePipeline::new(
            source,
            Arc::new(StaticIdentity::new(Some("42".to_string()))),
            SnapshotStore::new(state),
            NotificationEmitter::new(notifications.clone(), Arc::new(LogAlertSink)),
            ReminderEvaluator::from_hours(24),
        );
        (PollScheduler::new(Arc::new(pipeline), period), notifications)
    }

    fn create_scheduler(
        script: Vec<Result<Snapshot, String>>,
        period: Duration,
    ) -> (
        PollScheduler,
        Arc<ScriptedSource>,
        Arc<SqliteNotificationStore>,
    ) {
        let source = Arc::new(ScriptedSource::new(script));
        let (scheduler, notifications) = scheduler_with_source(source.clone(), period);
        (scheduler, source, notifications)
    }

    /// Source whose every fetch takes longer than the scheduler period.
    struct SlowSource {
        delay: Duration,
        started: AtomicUsize,
    }

    #[async_trait]
    impl RequestSource for SlowSource {
        async fn fetch_snapshot(&self, _student_id: &str) -> anyhow::Result<Snapshot> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(Snapshot::empty())
        }
    }

    #[tokio::test]
    async fn test_start_runs_immediate_tick_and_is_idempotent() {
        let (scheduler, source, _) = create_scheduler(vec![], Duration::from_secs(3600));

        assert!(!scheduler.is_running().await);
        assert!(scheduler.start().await);
        assert!(!scheduler.start().await);
        assert!(scheduler.is_running().await);

        for _ in 0..50 {
            if source.fetch_count() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(source.fetch_count(), 1);

        assert!(scheduler.stop().await);
        assert!(!scheduler.stop().await);
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn test_timer_keeps_polling_until_stopped() {
        let (scheduler, source, notifications) = create_scheduler(
            vec![Ok(snapshot("Pendiente")), Ok(snapshot("Rechazada"))],
            Duration::from_millis(20),
        );

        scheduler.start().await;
        for _ in 0..100 {
            if source.fetch_count() >= 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        scheduler.stop().await;

        assert!(source.fetch_count() >= 4);
        assert_eq!(notifications.count().unwrap(), 1);

        let stopped_at = source.fetch_count();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.fetch_count(), stopped_at);
    }

    #[tokio::test]
    async fn test_poll_now_without_start() {
        let (scheduler, _, notifications) = create_scheduler(
            vec![Ok(snapshot("Pendiente")), Ok(snapshot("Aprobada"))],
            Duration::from_secs(3600),
        );

        scheduler.poll_now().await.unwrap();
        let outcome = scheduler.poll_now().await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Completed {
                transitions: 1,
                notified: 1,
                reminders: 0
            }
        );
        assert_eq!(notifications.get_unread_count().unwrap(), 1);
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (scheduler, source, _) = create_scheduler(vec![], Duration::from_secs(3600));

        scheduler.start().await;
        scheduler.stop().await;
        assert!(scheduler.start().await);
        for _ in 0..50 {
            if source.fetch_count() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        scheduler.stop().await;
        assert!(source.fetch_count() >= 1);
    }

    #[tokio::test]
    async fn test_stop_during_slow_tick_starts_no_new_tick() {
        for _ in 0..10 {
            let source = Arc::new(SlowSource {
                delay: Duration::from_millis(60),
                started: AtomicUsize::new(0),
            });
            let (scheduler, _) = scheduler_with_source(source.clone(), Duration::from_millis(20));

            scheduler.start().await;
            while source.started.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;

            let started_before_stop = source.started.load(Ordering::SeqCst);
            assert!(scheduler.stop().await);
            assert_eq!(source.started.load(Ordering::SeqCst), started_before_stop);
        }
    }
}
