use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{http_client, request_error};
use crate::config::TelegramConfig;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

// Bot API rejects longer texts.
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    description: Option<String>,
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Sends plain-text messages to one operator chat through the Bot API.
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig, timeout: Duration) -> Result<Self> {
        Ok(TelegramNotifier {
            client: http_client(timeout)?,
            config,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    fn delivery_error(&self, message: impl Into<String>) -> AppError {
        AppError::Delivery {
            notifier: self.plugin_type().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        let text: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
        let payload = json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| request_error(self.plugin_type(), e, self.timeout))?;

        let status = response.status();
        let body: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| self.delivery_error(format!("HTTP {}: {}", status, e)))?;

        if !status.is_success() || !body.ok {
            return Err(self.delivery_error(format!(
                "HTTP {}: {}",
                status,
                body.description.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        Ok(NotificationResult {
            message_id: body.result.map(|m| m.message_id.to_string()),
            delivered: 1,
        })
    }
}
