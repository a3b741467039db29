pub mod fetchers;
pub mod manager;
pub mod notifiers;
pub mod traits;

pub use manager::PluginManager;
pub use traits::{ContentFetcher, NotificationResult, NotifierPlugin};
