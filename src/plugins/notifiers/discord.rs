use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::{http_client, request_error};
use crate::config::DiscordConfig;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

// Discord rejects message content longer than this.
const MAX_CONTENT_CHARS: usize = 2000;

pub struct DiscordNotifier {
    client: Client,
    config: DiscordConfig,
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig, timeout: Duration) -> Result<Self> {
        Ok(DiscordNotifier {
            client: http_client(timeout)?,
            config,
            timeout,
        })
    }

    fn create_webhook_payload(&self, message: &str) -> serde_json::Value {
        // Add mentions
        let mut content_parts = Vec::new();

        if let Some(role) = &self.config.mention_role {
            content_parts.push(format!("<@&{}>", role));
        }

        if let Some(user) = &self.config.mention_user {
            content_parts.push(format!("<@{}>", user));
        }

        content_parts.push(message.to_string());
        let content: String = content_parts.join(" ").chars().take(MAX_CONTENT_CHARS).collect();

        let mut payload = json!({ "content": content });

        // Add webhook customization
        if let Some(username) = &self.config.username {
            payload["username"] = json!(username);
        }

        if let Some(avatar_url) = &self.config.avatar_url {
            payload["avatar_url"] = json!(avatar_url);
        }

        payload
    }
}

#[async_trait]
impl NotifierPlugin for DiscordNotifier {
    fn name(&self) -> &str {
        "Discord Notifier"
    }

    fn plugin_type(&self) -> &str {
        "discord"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        let payload = self.create_webhook_payload(message);

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| request_error(self.plugin_type(), e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Delivery {
                notifier: self.plugin_type().to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        Ok(NotificationResult {
            message_id: None,
            delivered: 1,
        })
    }
}
