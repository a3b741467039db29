use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, Result};

/// A catalog page registered for watching. The id is the page URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedResource {
    pub id: String,
    pub added_at: DateTime<Utc>,
}

impl TrackedResource {
    pub fn new(url: &str) -> Result<Self> {
        let url = url.trim();
        let parsed = url::Url::parse(url)
            .map_err(|e| AppError::Validation(format!("Invalid URL '{}': {}", url, e)))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AppError::Validation(format!(
                    "Unsupported URL scheme '{}' for {}",
                    other, url
                )));
            }
        }

        Ok(Self {
            id: url.to_string(),
            added_at: Utc::now(),
        })
    }
}
