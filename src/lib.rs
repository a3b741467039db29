pub mod config;
pub mod core;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use core::{ChangeDetector, Decision, SnapshotBuilder, WatchState};
pub use scheduler::{CycleReport, PollScheduler};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
