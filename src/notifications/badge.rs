//! Unread badge shown next to the notification list.

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::store::NotificationStore;

/// Largest count shown verbatim on the badge.
pub const BADGE_MAX_COUNT: usize = 99;

/// Display-only copy of the store's unread counter, refreshed periodically.
pub struct BadgeCounter {
    store: Arc<dyn NotificationStore>,
    cached: AtomicUsize,
}

impl BadgeCounter {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self {
            store,
            cached: AtomicUsize::new(0),
        }
    }

    /// Last refreshed count. May lag behind the store.
    pub fn get_count(&self) -> usize {
        self.cached.load(Ordering::Relaxed)
    }

    /// Reload the cached counter from the store.
    pub fn refresh(&self) -> Result<usize> {
        let count = self.store.get_unread_count()?;
        self.cached.store(count, Ordering::Relaxed);
        Ok(count)
    }

    /// Count unread notifications directly, bypassing every cache.
    pub fn recount(&self) -> Result<usize> {
        let count = self.store.get_unread()?.len();
        self.cached.store(count, Ordering::Relaxed);
        Ok(count)
    }

    /// Badge text for the cached count, `None` when nothing is unread.
    pub fn label(&self) -> Option<String> {
        badge_label(self.get_count())
    }
}

pub fn badge_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_MAX_COUNT => Some(format!("{}+", BADGE_MAX_COUNT)),
        n => Some(n.to_string()),
    }
}
