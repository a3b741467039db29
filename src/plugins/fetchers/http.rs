use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;

use crate::config::ScraperConfig;
use crate::models::RawContent;
use crate::plugins::traits::ContentFetcher;
use crate::utils::error::{AppError, Result};

/// Plain HTTP GET of the page body.
pub struct HttpFetcher {
    client: Client,
    request_timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            request_timeout: config.timeout(),
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn fetch_once(&self, resource_id: &str) -> Result<String> {
        let response = self
            .client
            .get(resource_id)
            .send()
            .await
            .map_err(|e| self.map_request_error(resource_id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                resource: resource_id.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| self.map_request_error(resource_id, e))
    }

    fn map_request_error(&self, resource_id: &str, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout {
                resource: resource_id.to_string(),
                timeout_secs: self.request_timeout.as_secs(),
            }
        } else {
            AppError::Fetch {
                resource: resource_id.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Client errors won't fix themselves on retry; everything else might.
fn is_retryable(err: &AppError) -> bool {
    match err {
        AppError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
        AppError::Fetch { .. } | AppError::Timeout { .. } => true,
        _ => false,
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn timeout(&self) -> Duration {
        let attempts = self.retry_attempts.saturating_add(1);
        self.request_timeout
            .saturating_mul(attempts)
            .saturating_add(self.retry_delay.saturating_mul(self.retry_attempts))
    }

    async fn fetch(&self, resource_id: &str) -> Result<RawContent> {
        let fetched_at = Utc::now();
        let strategy = FixedInterval::new(self.retry_delay).take(self.retry_attempts as usize);

        let text = RetryIf::spawn(strategy, || self.fetch_once(resource_id), is_retryable).await?;

        tracing::debug!(resource = %resource_id, bytes = text.len(), "Fetched page");
        Ok(RawContent::new(resource_id, text, fetched_at))
    }
}
