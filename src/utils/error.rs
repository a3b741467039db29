use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch failed for {resource}: {message}")]
    Fetch { resource: String, message: String },

    #[error("Fetch timed out for {resource} after {timeout_secs}s")]
    Timeout { resource: String, timeout_secs: u64 },

    #[error("Unexpected HTTP status {status} from {resource}")]
    HttpStatus { resource: String, status: u16 },

    #[error("Extraction failed for {resource}: {message}")]
    Extraction { resource: String, message: String },

    #[error("Delivery failed via {notifier}: {message}")]
    Delivery { notifier: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures that mean "this resource could not be scanned this cycle".
    pub fn is_scan_failure(&self) -> bool {
        matches!(
            self,
            AppError::Fetch { .. }
                | AppError::Timeout { .. }
                | AppError::HttpStatus { .. }
                | AppError::Http(_)
                | AppError::Extraction { .. }
        )
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
