//! Offer maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! uephone-cli offers sweep
//! ```
//!
//! A sweep does what the server's timers do, for offers whose timers were
//! lost: stale offers expire and overdue ones go through the auto-accept
//! policy. Offers still inside their delay are left for the server.

use uephone_storefront::config::OfferConfig;
use uephone_storefront::services::offers::OfferResolver;
use uephone_storefront::services::telegram::Notifier;

use super::{CommandError, connect};

/// Resolve every overdue pending offer once.
///
/// Telegram is not notified: the process exits before background sends
/// would complete.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a query fails.
pub async fn sweep() -> Result<(), CommandError> {
    let config = OfferConfig::from_env()?;
    let pool = connect().await?;

    let report = OfferResolver::new(pool, Notifier::disabled(), config)
        .sweep()
        .await?;

    tracing::info!(
        expired = report.expired,
        accepted = report.accepted,
        rejected = report.rejected,
        "Offer sweep complete"
    );
    Ok(())
}
