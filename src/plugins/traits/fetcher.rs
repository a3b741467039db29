use async_trait::async_trait;
use std::time::Duration;

use crate::models::RawContent;
use crate::utils::error::Result;

/// Retrieves the final page text for a tracked resource.
///
/// Implementations enforce their own timeout and report it through
/// [`ContentFetcher::timeout`] so callers can bound the whole call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    fn name(&self) -> &str;
    fn timeout(&self) -> Duration;

    async fn fetch(&self, resource_id: &str) -> Result<RawContent>;
}
