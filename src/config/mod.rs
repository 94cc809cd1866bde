mod file_config;

pub use file_config::{FileConfig, NotificationsConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://universidad-la9h.onrender.com";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub api_base_url: String,
    pub student_id: Option<String>,
    pub poll_interval_secs: u64,
    pub http_timeout_sec: u64,
    pub badge_refresh_secs: u64,
    pub reminder_window_hours: u32,
    pub retention_days: u32,
    pub prune_interval_hours: u64,
    pub max_notifications: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            student_id: None,
            poll_interval_secs: 10,
            http_timeout_sec: 30,
            badge_refresh_secs: 30,
            reminder_window_hours: 24,
            retention_days: 30,
            prune_interval_hours: 24,
            max_notifications: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub api_base_url: String,
    /// Fixed identity; when absent the logged-in student from client state is used.
    pub student_id: Option<String>,
    pub poll_interval_secs: u64,
    pub http_timeout_sec: u64,
    pub badge_refresh_secs: u64,

    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub reminder_window_hours: u32,
    pub retention_days: u32,
    pub prune_interval_hours: u64,
    pub max_notifications: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        // Validate db_dir exists
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let api_base_url = file
            .api_base_url
            .unwrap_or_else(|| cli.api_base_url.clone());
        let student_id = file
            .student_id
            .or_else(|| cli.student_id.clone())
            .filter(|id| !id.trim().is_empty());

        let poll_interval_secs = file.poll_interval_secs.unwrap_or(cli.poll_interval_secs);
        if poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than 0");
        }
        let http_timeout_sec = file.http_timeout_sec.unwrap_or(cli.http_timeout_sec);
        let badge_refresh_secs = file.badge_refresh_secs.unwrap_or(cli.badge_refresh_secs);
        if badge_refresh_secs == 0 {
            bail!("badge_refresh_secs must be greater than 0");
        }

        let notifications_file = file.notifications.unwrap_or_default();
        let notifications = NotificationSettings {
            reminder_window_hours: notifications_file
                .reminder_window_hours
                .unwrap_or(cli.reminder_window_hours),
            retention_days: notifications_file
                .retention_days
                .unwrap_or(cli.retention_days),
            prune_interval_hours: notifications_file
                .prune_interval_hours
                .unwrap_or(cli.prune_interval_hours),
            max_notifications: notifications_file
                .max_notifications
                .unwrap_or(cli.max_notifications),
        };
        if notifications.retention_days > 0 && notifications.prune_interval_hours == 0 {
            bail!("prune_interval_hours must be greater than 0 when pruning is enabled");
        }

        Ok(Self {
            db_dir,
            api_base_url,
            student_id,
            poll_interval_secs,
            http_timeout_sec,
            badge_refresh_secs,
            notifications,
        })
    }

    pub fn notifier_db_path(&self) -> PathBuf {
        self.db_dir.join("notifications.db")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn badge_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.badge_refresh_secs)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.notifications.prune_interval_hours * 60 * 60)
    }
}
