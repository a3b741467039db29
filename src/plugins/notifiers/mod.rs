// Notifier plugin implementations
pub mod discord;
pub mod log;
pub mod telegram;

pub use discord::DiscordNotifier;
pub use log::LogNotifier;
pub use telegram::TelegramNotifier;

use reqwest::Client;
use std::time::Duration;

use crate::utils::error::{AppError, Result};

/// HTTP client shared by the webhook-style notifiers; every request is bounded.
pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

pub(crate) fn request_error(notifier: &str, err: reqwest::Error, timeout: Duration) -> AppError {
    let message = if err.is_timeout() {
        format!("no response within {}s", timeout.as_secs())
    } else {
        err.to_string()
    };
    AppError::Delivery {
        notifier: notifier.to_string(),
        message,
    }
}
