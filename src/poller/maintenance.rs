//! Background maintenance: notification retention and badge refresh.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::notifications::{BadgeCounter, NotificationStore};

/// Periodically drop notifications older than `retention_days`.
///
/// Returns `None` when `retention_days` is 0, which disables pruning. The
/// first run happens after one full interval.
pub fn spawn_retention_pruning(
    store: Arc<dyn NotificationStore>,
    retention_days: u32,
    interval: Duration,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    if retention_days == 0 {
        info!("Notification pruning disabled");
        return None;
    }

    info!(
        "Notification pruning enabled: retaining {} days, pruning every {:?}",
        retention_days, interval
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match store.prune_older_than(retention_days) {
                Ok(count) => {
                    if count > 0 {
                        info!("Pruned {} old notifications", count);
                    }
                }
                Err(e) => {
                    error!("Failed to prune notifications: {}", e);
                }
            }
        }
    }))
}

/// Keep the badge's cached count fresh.
pub fn spawn_badge_refresh(
    badge: Arc<BadgeCounter>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match badge.refresh() {
                Ok(count) => debug!("Unread badge: {}", count),
                Err(e) => error!("Failed to refresh unread badge: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{NewNotification, NotificationKind, SqliteNotificationStore};
    use crate::sqlite_persistence::open_in_memory;
    use chrono::Utc;

    fn new_notification(request_id: i64) -> NewNotification {
        NewNotification {
            title: "t".to_string(),
            message: "m".to_string(),
            kind: NotificationKind::RequestPending,
            request_id: Some(request_id),
            subject_name: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_pruning_disabled_with_zero_retention() {
        let store = Arc::new(SqliteNotificationStore::new(open_in_memory().unwrap(), 100));
        let handle = spawn_retention_pruning(
            store,
            0,
            Duration::from_millis(10),
            CancellationToken::new(),
        );
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn test_pruning_task_removes_expired_notifications() {
        let store = Arc::new(SqliteNotificationStore::new(open_in_memory().unwrap(), 100));
        store
            .append_at(new_notification(1), Utc::now() - chrono::Duration::days(40))
            .unwrap();
        store.append(new_notification(2)).unwrap();

        let cancel = CancellationToken::new();
        let handle = spawn_retention_pruning(
            store.clone(),
            30,
            Duration::from_millis(20),
            cancel.clone(),
        )
        .unwrap();

        for _ in 0..50 {
            if store.count().unwrap() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        let remaining = store.get_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].request_id, Some(2));
    }

    #[tokio::test]
    async fn test_badge_refresh_task_updates_count() {
        let store = Arc::new(SqliteNotificationStore::new(open_in_memory().unwrap(), 100));
        let badge = Arc::new(BadgeCounter::new(store.clone()));
        store.append(new_notification(1)).unwrap();
        store.append(new_notification(2)).unwrap();

        let cancel = CancellationToken::new();
        let handle = spawn_badge_refresh(badge.clone(), Duration::from_millis(10), cancel.clone());

        for _ in 0..50 {
            if badge.get_count() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(badge.get_count(), 2);
    }
}
