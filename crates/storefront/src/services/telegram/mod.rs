//! Telegram notifications.
//!
//! This module provides:
//! - [`TelegramClient`] for the Bot API `sendMessage` call
//! - [`Notification`] and the HTML message builders
//! - [`Notifier`], which sends in the background and only logs failures

mod client;
mod error;
mod messages;
mod notifier;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use messages::{Notification, NotificationLine, escape_html, format_cart_items};
pub use notifier::Notifier;
