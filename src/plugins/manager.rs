use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::notifiers::{DiscordNotifier, LogNotifier, TelegramNotifier};
use super::traits::{NotificationResult, NotifierPlugin};
use crate::config::NotificationsConfig;
use crate::utils::error::{AppError, Result};

pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Fans each message out to every registered notifier.
///
/// Delivery counts as successful when at least one notifier accepts the
/// message; individual failures are logged.
#[derive(Clone)]
pub struct PluginManager {
    notifiers: Arc<RwLock<Vec<NotifierPluginBox>>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a notifier plugin
    pub async fn register_notifier(&self, plugin: NotifierPluginBox) {
        let mut notifiers = self.notifiers.write().await;
        tracing::info!(notifier = plugin.plugin_type(), "Registered notifier");
        notifiers.push(plugin);
    }

    /// Check if a notifier plugin exists
    pub async fn has_notifier(&self, plugin_type: &str) -> bool {
        let notifiers = self.notifiers.read().await;
        notifiers.iter().any(|n| n.plugin_type() == plugin_type)
    }

    /// List all registered notifier types
    pub async fn list_notifier_types(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().await;
        notifiers.iter().map(|n| n.plugin_type().to_string()).collect()
    }

    /// Registers the configured channels, or the log notifier when none are configured.
    pub async fn initialize_from_config(&self, config: &NotificationsConfig) -> Result<()> {
        if let Some(telegram) = &config.telegram {
            let notifier = TelegramNotifier::new(telegram.clone(), config.timeout())?;
            self.register_notifier(Box::new(notifier)).await;
        }

        if let Some(discord) = &config.discord {
            let notifier = DiscordNotifier::new(discord.clone(), config.timeout())?;
            self.register_notifier(Box::new(notifier)).await;
        }

        if self.notifiers.read().await.is_empty() {
            tracing::warn!("No notification channel configured; alerts will only be logged");
            self.register_notifier(Box::new(LogNotifier::new())).await;
        }
        Ok(())
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifierPlugin for PluginManager {
    fn name(&self) -> &str {
        "Plugin Manager"
    }

    fn plugin_type(&self) -> &str {
        "broadcast"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        let notifiers = self.notifiers.read().await;
        if notifiers.is_empty() {
            return Err(AppError::Delivery {
                notifier: self.plugin_type().to_string(),
                message: "no notifiers registered".to_string(),
            });
        }

        let mut delivered = 0;
        let mut message_id = None;
        let mut errors = Vec::new();

        for notifier in notifiers.iter() {
            match notifier.notify(message).await {
                Ok(result) => {
                    delivered += result.delivered;
                    message_id = message_id.or(result.message_id);
                }
                Err(e) => {
                    tracing::warn!(notifier = notifier.plugin_type(), error = %e, "Notifier failed");
                    errors.push(e.to_string());
                }
            }
        }

        if delivered == 0 {
            return Err(AppError::Delivery {
                notifier: self.plugin_type().to_string(),
                message: errors.join("; "),
            });
        }

        Ok(NotificationResult {
            message_id,
            delivered,
        })
    }
}
