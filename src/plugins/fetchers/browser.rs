use async_trait::async_trait;
use chrono::Utc;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::models::RawContent;
use crate::plugins::traits::ContentFetcher;
use crate::utils::error::{AppError, Result};

// Headless Chrome instances are heavy; never keep more than this alive.
const MAX_BROWSERS: usize = 3;

pub struct BrowserPool {
    browsers: Vec<Arc<Browser>>,
    current_index: AtomicUsize,
}

impl BrowserPool {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let size = config.max_concurrent_checks.clamp(1, MAX_BROWSERS);
        let mut browsers = Vec::with_capacity(size);

        for _ in 0..size {
            let mut launch_options = LaunchOptions::default_builder()
                .headless(true)
                .sandbox(false) // Often needed in containerized environments
                .args(vec![
                    OsStr::new("--no-sandbox"),
                    OsStr::new("--disable-dev-shm-usage"),
                    OsStr::new("--disable-gpu"),
                    OsStr::new("--disable-extensions"),
                ])
                .build()
                .map_err(|e| AppError::Internal(format!("Failed to create launch options: {}", e)))?;

            if let Some(chrome_path) = &config.chrome_path {
                launch_options.path = Some(std::path::PathBuf::from(chrome_path));
            }

            let browser = Browser::new(launch_options)
                .map_err(|e| AppError::Internal(format!("Failed to launch browser: {}", e)))?;
            browsers.push(Arc::new(browser));
        }

        tracing::info!(browsers = browsers.len(), "Browser pool ready");
        Ok(Self {
            browsers,
            current_index: AtomicUsize::new(0),
        })
    }

    pub fn get_browser(&self) -> Arc<Browser> {
        let index = self.current_index.fetch_add(1, Ordering::Relaxed) % self.browsers.len();
        Arc::clone(&self.browsers[index])
    }
}

/// Renders the page in headless Chrome and returns the final document HTML.
pub struct BrowserFetcher {
    pool: Arc<BrowserPool>,
    user_agent: String,
    timeout: Duration,
}

impl BrowserFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            pool: Arc::new(BrowserPool::new(config)?),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        })
    }

    fn render(browser: &Browser, url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<String> {
        let tab = browser.new_tab()?;
        tab.set_default_timeout(timeout);

        // Dropping a Tab leaves the page open in the pooled browser.
        run_then_close(
            || {
                tab.set_user_agent(user_agent, None, None)?;
                tab.navigate_to(url)?;
                tab.wait_until_navigated()?;
                Ok(tab.get_content()?)
            },
            || tab.close(true).map(|_| ()),
        )
    }
}

/// Runs `work`, then `close` whatever the outcome. A close failure is only
/// logged so it never masks the result of `work`.
fn run_then_close<T>(
    work: impl FnOnce() -> anyhow::Result<T>,
    close: impl FnOnce() -> anyhow::Result<()>,
) -> anyhow::Result<T> {
    let result = work();
    if let Err(e) = close() {
        tracing::debug!(error = %e, "Failed to close browser tab");
    }
    result
}

#[async_trait]
impl ContentFetcher for BrowserFetcher {
    fn name(&self) -> &str {
        "browser"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, resource_id: &str) -> Result<RawContent> {
        let fetched_at = Utc::now();
        let browser = self.pool.get_browser();
        let url = resource_id.to_string();
        let user_agent = self.user_agent.clone();
        let timeout = self.timeout;

        let task = tokio::task::spawn_blocking(move || {
            Self::render(&browser, &url, &user_agent, timeout)
        });

        let html = match tokio::time::timeout(timeout, task).await {
            Err(_) => {
                return Err(AppError::Timeout {
                    resource: resource_id.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            Ok(Err(join_err)) => {
                return Err(AppError::Fetch {
                    resource: resource_id.to_string(),
                    message: format!("Render task failed: {}", join_err),
                });
            }
            Ok(Ok(rendered)) => rendered.map_err(|e| AppError::Fetch {
                resource: resource_id.to_string(),
                message: e.to_string(),
            })?,
        };

        tracing::debug!(resource = %resource_id, bytes = html.len(), "Rendered page");
        Ok(RawContent::new(resource_id, html, fetched_at))
    }
}
