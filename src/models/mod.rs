pub mod snapshot;
pub mod tracked_resource;

// Re-exports for convenience
pub use snapshot::*;
pub use tracked_resource::*;

use chrono::{DateTime, Utc};

/// Page text returned by a fetcher for one resource.
#[derive(Debug, Clone)]
pub struct RawContent {
    pub resource_id: String,
    pub text: String,
    /// When the fetch started; snapshots are ordered by this.
    pub fetched_at: DateTime<Utc>,
}

impl RawContent {
    pub fn new(resource_id: impl Into<String>, text: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            resource_id: resource_id.into(),
            text: text.into(),
            fetched_at,
        }
    }
}
