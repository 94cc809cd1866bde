//! Local alert delivery.

use anyhow::Result;
use tracing::info;

use super::models::LocalAlert;

/// Platform facility that shows an OS-level alert. Delivery is fire-and-forget.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, alert: &LocalAlert) -> Result<()>;
}

/// Writes alerts to the log. Used where no notification centre is available.
#[derive(Debug, Default, Clone)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn deliver(&self, alert: &LocalAlert) -> Result<()> {
        let payload = serde_json::to_string(&alert.payload)?;
        info!(
            sound = alert.sound,
            payload = %payload,
            "{}: {}",
            alert.title,
            alert.body
        );
        Ok(())
    }
}
