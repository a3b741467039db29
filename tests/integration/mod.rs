// Integration tests for Catalog Sentinel
// These tests drive whole poll cycles through scripted fetchers and a
// recording notifier.

pub mod poll_cycle_tests;
pub mod registry_tests;

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use catalog_sentinel::config::AppConfig;
use catalog_sentinel::models::RawContent;
use catalog_sentinel::plugins::{ContentFetcher, NotificationResult, NotifierPlugin};
use catalog_sentinel::utils::error::{AppError, Result};
use catalog_sentinel::{PollScheduler, WatchState};

pub const SNEAKERS: &str = "https://shop.example/c/sneakers";
pub const BAGS: &str = "https://shop.example/c/bags";
pub const WATCHES: &str = "https://shop.example/c/watches";

/// Fetch timeout used by [`ScriptedFetcher`]; hanging steps exceed it.
pub const FETCH_TIMEOUT: Duration = Duration::from_millis(200);

pub fn catalog_page(prices: &[&str]) -> String {
    let items: Vec<String> = prices
        .iter()
        .map(|p| format!("<li class=\"product\">Sneaker <span>₹{}</span> Add to bag</li>", p))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", items.join(""))
}

pub enum Step {
    Page(String),
    Fail(&'static str),
    /// Never completes within [`FETCH_TIMEOUT`].
    Hang,
    /// Signals `started`, then waits for `release` before returning the page.
    Gated(String),
}

/// Replays a per-URL queue of fetch results. An exhausted queue repeats
/// its last page.
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    last_page: Mutex<HashMap<String, String>>,
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            last_page: Mutex::new(HashMap::new()),
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    pub fn script(self, url: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.into_iter().collect());
        self
    }

    fn next_step(&self, url: &str) -> Option<Step> {
        self.scripts.lock().unwrap().get_mut(url).and_then(|q| q.pop_front())
    }

    fn page(&self, url: &str, text: String) -> Result<RawContent> {
        self.last_page.lock().unwrap().insert(url.to_string(), text.clone());
        Ok(RawContent::new(url, text, Utc::now()))
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    fn timeout(&self) -> Duration {
        FETCH_TIMEOUT
    }

    async fn fetch(&self, resource_id: &str) -> Result<RawContent> {
        match self.next_step(resource_id) {
            Some(Step::Page(text)) => self.page(resource_id, text),
            Some(Step::Fail(message)) => Err(AppError::Fetch {
                resource: resource_id.to_string(),
                message: message.to_string(),
            }),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AppError::Internal("woke from hang".to_string()))
            }
            Some(Step::Gated(text)) => {
                self.started.notify_one();
                self.release.notified().await;
                self.page(resource_id, text)
            }
            None => {
                let last = self.last_page.lock().unwrap().get(resource_id).cloned();
                match last {
                    Some(text) => self.page(resource_id, text),
                    None => Err(AppError::NotFound {
                        resource: resource_id.to_string(),
                    }),
                }
            }
        }
    }
}

/// Keeps every delivered message for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.filtered("CATALOG UPDATE DETECTED")
    }

    pub fn failures(&self) -> Vec<String> {
        self.filtered("Scan error")
    }

    fn filtered(&self, marker: &str) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.contains(marker))
            .collect()
    }
}

#[async_trait]
impl NotifierPlugin for RecordingNotifier {
    fn name(&self) -> &str {
        "Recording"
    }

    fn plugin_type(&self) -> &str {
        "recording"
    }

    async fn notify(&self, message: &str) -> Result<NotificationResult> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(NotificationResult {
            message_id: None,
            delivered: 1,
        })
    }
}

/// Test configuration for integration tests
pub fn get_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.scraper.max_concurrent_checks = 4;
    config.scheduler.initial_delay_secs = 0;
    config
}

pub async fn create_test_scheduler(
    urls: &[&str],
    fetcher: Arc<ScriptedFetcher>,
    notifier: Arc<RecordingNotifier>,
) -> anyhow::Result<PollScheduler> {
    let state = Arc::new(WatchState::new());
    for url in urls {
        state.add(url).await?;
    }
    Ok(PollScheduler::from_config(
        &get_test_config(),
        state,
        fetcher,
        notifier,
    )?)
}
