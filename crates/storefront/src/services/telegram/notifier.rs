//! Fire-and-forget delivery of store notifications.

use tracing::{debug, warn};

use super::client::TelegramClient;
use super::messages::Notification;

/// Delivers [`Notification`]s to Telegram when it is configured.
///
/// Sends run on their own task; failures are logged and never reach the
/// request that triggered them.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    client: Option<TelegramClient>,
}

impl Notifier {
    #[must_use]
    pub const fn new(client: Option<TelegramClient>) -> Self {
        Self { client }
    }

    /// A notifier that drops everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { client: None }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Render `notification` and send it in the background.
    ///
    /// Must be called from within a Tokio runtime when enabled.
    pub fn notify(&self, notification: Notification) {
        let kind = notification.kind();
        let Some(client) = self.client.clone() else {
            debug!(kind, "Telegram not configured, skipping notification");
            return;
        };

        let text = notification.render();
        tokio::spawn(async move {
            if let Err(e) = client.send_message(&text).await {
                warn!(kind, error = %e, "Telegram notification failed");
            }
        });
    }
}
