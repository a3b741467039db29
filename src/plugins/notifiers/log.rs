use async_trait::async_trait;

use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::Result;

/// Writes messages to the log. Used when no remote channel is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        LogNotifier
    }
}

#[async_trait]
impl NotifierPlugin for LogNotifier {
    fn name(&self) -> &str {
        "Log Notifier"
    }

    fn plugin_type(&self) -> &str {
        "log"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        tracing::info!(target: "catalog_sentinel::notification", "{}", message);
        Ok(NotificationResult {
            message_id: None,
            delivered: 1,
        })
    }
}
