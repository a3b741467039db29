use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub message_id: Option<String>,
    /// Number of channels the message reached.
    pub delivered: usize,
}

/// Trait for implementing notification channels (Telegram, Discord, etc.)
///
/// Failures are returned as `AppError::Delivery`; callers log them and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    async fn notify(&self, message: &str) -> Result<NotificationResult>;
}
