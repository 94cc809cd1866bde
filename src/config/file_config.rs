use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub api_base_url: Option<String>,
    pub student_id: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub http_timeout_sec: Option<u64>,
    pub badge_refresh_secs: Option<u64>,

    pub notifications: Option<NotificationsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct NotificationsConfig {
    pub reminder_window_hours: Option<u32>,
    /// Set to 0 to keep notifications forever.
    pub retention_days: Option<u32>,
    pub prune_interval_hours: Option<u64>,
    /// Set to 0 to disable the history cap.
    pub max_notifications: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
db_dir = "/var/lib/notifier"
api_base_url = "http://localhost:4000"
student_id = "1001"
poll_interval_secs = 15

[notifications]
retention_days = 7
max_notifications = 50
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.db_dir.as_deref(), Some("/var/lib/notifier"));
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:4000"));
        assert_eq!(config.student_id.as_deref(), Some("1001"));
        assert_eq!(config.poll_interval_secs, Some(15));
        assert!(config.http_timeout_sec.is_none());

        let notifications = config.notifications.unwrap();
        assert_eq!(notifications.retention_days, Some(7));
        assert_eq!(notifications.max_notifications, Some(50));
        assert!(notifications.reminder_window_hours.is_none());
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.db_dir.is_none());
        assert!(config.notifications.is_none());
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "poll_interval_secs = \"often\"").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
