//! Offer resolution shared by timers, admins and customers.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};

use uephone_core::{OfferDecision, OfferId, OfferStatus, ResolvedBy};

use super::OfferError;
use super::scheduler::{OfferScheduler, ResolveOnTimeout};
use crate::config::OfferConfig;
use crate::db::{CustomerRepository, OfferRepository, cart, offers, stock};
use crate::models::Offer;
use crate::services::telegram::{Notification, Notifier};

/// Counts from a recovery or sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Offers handed back to the scheduler with time still left.
    pub rescheduled: usize,
}

/// Moves pending offers to a terminal state.
#[derive(Debug, Clone)]
pub struct OfferResolver {
    pool: PgPool,
    notifier: Notifier,
    config: OfferConfig,
}

impl OfferResolver {
    #[must_use]
    pub const fn new(pool: PgPool, notifier: Notifier, config: OfferConfig) -> Self {
        Self {
            pool,
            notifier,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &OfferConfig {
        &self.config
    }

    /// Resolve a pending offer.
    ///
    /// Accepting merges the offer into the owner's cart in the same
    /// transaction. Returns `None` when the offer was already resolved.
    ///
    /// # Errors
    ///
    /// Returns `OfferError::ItemNotFound` when accepting an offer whose phone
    /// has left the catalogue; the offer stays pending.
    /// Returns `OfferError::Repository` if the transaction fails.
    #[instrument(skip(self), fields(offer_id = %id, status = %status, resolved_by = %resolved_by))]
    pub async fn resolve(
        &self,
        id: OfferId,
        status: OfferStatus,
        resolved_by: ResolvedBy,
    ) -> Result<Option<Offer>, OfferError> {
        let mut tx = self.pool.begin().await?;

        let Some(offer) = offers::resolve(&mut *tx, id, status, resolved_by).await? else {
            tx.rollback().await?;
            debug!("Offer already resolved");
            return Ok(None);
        };

        if status == OfferStatus::Accepted {
            let item = match offer.stock_item_id {
                Some(stock_item_id) => stock::find(&mut *tx, stock_item_id).await?,
                None => None,
            };
            let Some(item) = item else {
                tx.rollback().await?;
                warn!("Offer item is no longer listed");
                return Err(OfferError::ItemNotFound);
            };

            let mut line = item.cart_line(offer.offer_price, offer.quantity);
            line.offer_id = Some(offer.id);
            line.offered_quantity = Some(offer.quantity);
            let outcome = cart::add(&mut tx, offer.user_id, line).await?;
            debug!(?outcome, "Merged accepted offer into cart");
        }

        tx.commit().await?;

        info!(user_id = %offer.user_id, "Offer resolved");
        self.announce(&offer).await;

        Ok(Some(offer))
    }

    /// Decide a pending offer with the auto-accept policy, or expire it if it
    /// has outlived the TTL.
    ///
    /// # Errors
    ///
    /// Returns `OfferError::Repository` if a query fails.
    #[instrument(skip(self), fields(offer_id = %id))]
    pub async fn auto_resolve(&self, id: OfferId) -> Result<Option<Offer>, OfferError> {
        let Some(offer) = OfferRepository::new(&self.pool).get(id).await? else {
            warn!("Timer fired for unknown offer");
            return Ok(None);
        };
        if !offer.status.is_pending() {
            return Ok(None);
        }

        let (status, resolved_by) = if offer.is_stale(self.config.ttl, Utc::now()) {
            (OfferStatus::Expired, ResolvedBy::Expiry)
        } else {
            match self.config.policy.decide(&offer.terms()) {
                OfferDecision::Accept => (OfferStatus::Accepted, ResolvedBy::Auto),
                OfferDecision::Reject => (OfferStatus::Rejected, ResolvedBy::Auto),
            }
        };

        match self.resolve(id, status, resolved_by).await {
            Err(OfferError::ItemNotFound) => {
                self.resolve(id, OfferStatus::Expired, ResolvedBy::Expiry)
                    .await
            }
            resolved => resolved,
        }
    }

    /// Expire stale offers and hand every remaining pending offer back to
    /// `scheduler` with the time it has left. Run once at startup.
    ///
    /// # Errors
    ///
    /// Returns `OfferError::Repository` if a query fails.
    #[instrument(skip_all)]
    pub async fn recover(&self, scheduler: &OfferScheduler) -> Result<SweepReport, OfferError> {
        let mut report = SweepReport {
            expired: self.expire_stale().await?,
            ..SweepReport::default()
        };

        let now = Utc::now();
        for offer in OfferRepository::new(&self.pool).list_pending().await? {
            scheduler.schedule(
                offer.id,
                offer.remaining_delay(self.config.auto_accept_after, now),
            );
            report.rescheduled += 1;
        }

        info!(
            expired = report.expired,
            rescheduled = report.rescheduled,
            "Recovered pending offers"
        );
        Ok(report)
    }

    /// Expire stale offers and decide every overdue one now, without a
    /// scheduler. Offers still inside their delay are left alone.
    ///
    /// # Errors
    ///
    /// Returns `OfferError::Repository` if a query fails.
    #[instrument(skip_all)]
    pub async fn sweep(&self) -> Result<SweepReport, OfferError> {
        let mut report = SweepReport {
            expired: self.expire_stale().await?,
            ..SweepReport::default()
        };

        let now = Utc::now();
        for offer in OfferRepository::new(&self.pool).list_pending().await? {
            if !offer
                .remaining_delay(self.config.auto_accept_after, now)
                .is_zero()
            {
                report.rescheduled += 1;
                continue;
            }
            match self.auto_resolve(offer.id).await?.map(|o| o.status) {
                Some(OfferStatus::Accepted) => report.accepted += 1,
                Some(OfferStatus::Rejected) => report.rejected += 1,
                Some(OfferStatus::Expired) => report.expired += 1,
                Some(OfferStatus::Pending) | None => {}
            }
        }

        info!(
            expired = report.expired,
            accepted = report.accepted,
            rejected = report.rejected,
            "Offer sweep complete"
        );
        Ok(report)
    }

    async fn expire_stale(&self) -> Result<usize, OfferError> {
        let expired = OfferRepository::new(&self.pool)
            .expire_stale(self.config.ttl)
            .await?;
        for offer in &expired {
            self.announce(offer).await;
        }
        Ok(expired.len())
    }

    /// Send the resolution notification. Lookup failures only cost detail.
    async fn announce(&self, offer: &Offer) {
        if !self.notifier.is_enabled() {
            return;
        }
        let Some(resolved_by) = offer.decided_by else {
            return;
        };

        let customer_email = match CustomerRepository::new(&self.pool).get(offer.user_id).await {
            Ok(Some(customer)) => customer.email.to_string(),
            Ok(None) => "Unknown".to_string(),
            Err(e) => {
                warn!(error = %e, "Failed to load offer customer for notification");
                "Unknown".to_string()
            }
        };
        self.notifier.notify(Notification::OfferResolved {
            offer_id: offer.id,
            customer_email,
            product: offer.product_name.clone(),
            terms: offer.terms(),
            status: offer.status,
            resolved_by,
        });
    }
}

impl ResolveOnTimeout for OfferResolver {
    fn resolve_on_timeout(&self, id: OfferId) -> impl Future<Output = ()> + Send {
        async move {
            if let Err(e) = self.auto_resolve(id).await {
                error!(offer_id = %id, error = %e, "Failed to auto-resolve offer");
            }
        }
    }
}

/// Build a resolver and a scheduler that drives it.
#[must_use]
pub fn offer_engine(
    pool: PgPool,
    notifier: Notifier,
    config: OfferConfig,
) -> (Arc<OfferResolver>, OfferScheduler) {
    let resolver = Arc::new(OfferResolver::new(pool, notifier, config));
    let scheduler = OfferScheduler::new(Arc::clone(&resolver));
    (resolver, scheduler)
}
