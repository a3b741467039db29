use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::core::decision::SignificanceCriterion;
use crate::core::quantitative::DEFAULT_BUCKET_BOUNDS;
use crate::core::signal::{DEFAULT_KEYWORDS, DEFAULT_SLICE_CHARS};

/// Fetches may never be given less time than this.
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Upper bound on `scraper.retry_attempts`.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub scheduler: SchedulerConfig,
    pub detection: DetectionConfig,
    pub notifications: NotificationsConfig,
    pub watch: WatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    Http,
    Browser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub fetcher: FetcherKind,
    pub max_concurrent_checks: usize,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub request_timeout: u64,
    pub user_agent: String,
    pub chrome_path: Option<String>,
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherKind::Http,
            max_concurrent_checks: 4,
            retry_attempts: 1,
            retry_delay_ms: 1000,
            request_timeout: 20,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
            chrome_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub initial_delay_secs: u64,
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            initial_delay_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub keywords: Vec<String>,
    /// Characters sampled from each end of the page for the fingerprint.
    pub slice_chars: usize,
    /// Ascending lower bounds of the price buckets; the last bucket is open-ended.
    pub price_buckets: Vec<u64>,
    pub significance: Vec<SignificanceCriterion>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            slice_chars: DEFAULT_SLICE_CHARS,
            price_buckets: DEFAULT_BUCKET_BOUNDS.to_vec(),
            significance: vec![
                SignificanceCriterion::Fingerprint,
                SignificanceCriterion::ItemCount,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Per-request limit for every notifier HTTP call.
    pub timeout_secs: u64,
    pub telegram: Option<TelegramConfig>,
    pub discord: Option<DiscordConfig>,
}

impl NotificationsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Upper bound for one broadcast: channels are tried one after another.
    pub fn delivery_timeout(&self) -> Duration {
        let channels = [self.telegram.is_some(), self.discord.is_some()]
            .iter()
            .filter(|configured| **configured)
            .count()
            .max(1) as u32;
        self.timeout().saturating_mul(channels)
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            telegram: None,
            discord: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub mention_role: Option<String>,
    pub mention_user: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// When set, logs are also written to a daily-rolling file here.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "catalog-sentinel.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Built-in defaults, then the optional file, then `CATWATCH__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        } else {
            builder = builder.add_source(File::with_name("config/default").required(false));
        }

        let s = builder
            .add_source(
                Environment::with_prefix("CATWATCH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("watch.urls")
                    .with_list_parse_key("detection.keywords")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate scraper configuration
        if self.scraper.request_timeout < MIN_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::Message(format!(
                "Scraper request_timeout must be at least {} seconds",
                MIN_REQUEST_TIMEOUT_SECS
            )));
        }

        if self.scraper.max_concurrent_checks == 0 {
            return Err(ConfigError::Message("Scraper max_concurrent_checks must be greater than 0".into()));
        }

        if self.scraper.retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::Message(format!(
                "Scraper retry_attempts must be at most {}",
                MAX_RETRY_ATTEMPTS
            )));
        }

        if self.scraper.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Scraper user_agent must not be empty".into()));
        }

        // Validate scheduler configuration
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Message("Scheduler interval_secs must be greater than 0".into()));
        }

        // Validate detection configuration
        if self.detection.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Message("Detection keywords must contain at least one keyword".into()));
        }

        if self.detection.slice_chars == 0 {
            return Err(ConfigError::Message("Detection slice_chars must be greater than 0".into()));
        }

        if self.detection.price_buckets.is_empty()
            || self.detection.price_buckets.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(ConfigError::Message(
                "Detection price_buckets must be non-empty and strictly ascending".into(),
            ));
        }

        if self.detection.significance.is_empty() {
            return Err(ConfigError::Message("Detection significance needs at least one criterion".into()));
        }

        // Validate notifier configuration
        if self.notifications.timeout_secs == 0 {
            return Err(ConfigError::Message("Notifications timeout_secs must be greater than 0".into()));
        }

        if let Some(telegram) = &self.notifications.telegram {
            if telegram.bot_token.trim().is_empty() || telegram.chat_id.trim().is_empty() {
                return Err(ConfigError::Message("Telegram bot_token and chat_id are required".into()));
            }
            if Url::parse(&telegram.api_base).is_err() {
                return Err(ConfigError::Message("Invalid Telegram api_base URL".into()));
            }
        }

        if let Some(discord) = &self.notifications.discord {
            if !discord.webhook_url.starts_with("https://discord.com/api/webhooks/") {
                return Err(ConfigError::Message("Invalid Discord webhook URL format".into()));
            }
        }

        // Validate watched URLs
        for url in &self.watch.urls {
            if Url::parse(url).is_err() {
                return Err(ConfigError::Message(format!("Invalid watch URL: {}", url)));
            }
        }

        Ok(())
    }
}
