pub mod fetcher;
pub mod notifier;

pub use fetcher::ContentFetcher;
pub use notifier::{NotificationResult, NotifierPlugin};
