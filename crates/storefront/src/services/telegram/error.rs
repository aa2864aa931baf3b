//! Telegram-related errors.

use thiserror::Error;

/// Errors that can occur when talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed before a response arrived.
    #[error("Telegram request failed: {0}")]
    Request(String),

    /// Telegram answered with a non-2xx status or `ok: false`.
    #[error("Telegram API error: {0}")]
    Api(String),
}
