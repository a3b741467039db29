// Content fetcher implementations
pub mod browser;
pub mod http;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

use std::sync::Arc;

use crate::config::{FetcherKind, ScraperConfig};
use crate::plugins::traits::ContentFetcher;
use crate::utils::error::Result;

/// Builds the fetcher selected by `scraper.fetcher`.
pub fn build_fetcher(config: &ScraperConfig) -> Result<Arc<dyn ContentFetcher>> {
    Ok(match config.fetcher {
        FetcherKind::Http => Arc::new(HttpFetcher::new(config)?),
        FetcherKind::Browser => Arc::new(BrowserFetcher::new(config)?),
    })
}
