//! Negotiated price offers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use uephone_core::{OfferId, OfferStatus, OfferTerms, ResolvedBy, StockItemId, UserId};

/// A customer's offer on one stock item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    pub id: OfferId,
    pub user_id: UserId,
    /// `None` once the phone has been removed from the catalogue.
    pub stock_item_id: Option<StockItemId>,
    /// Phone name when the offer was made.
    pub product_name: String,
    /// Offered unit price in USD.
    pub offer_price: Decimal,
    /// Unit list price when the offer was made.
    pub list_price: Decimal,
    pub quantity: i32,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub decided_by: Option<ResolvedBy>,
}

impl Offer {
    #[must_use]
    pub const fn terms(&self) -> OfferTerms {
        OfferTerms::new(self.list_price, self.offer_price, self.quantity)
    }

    /// Time left before a pending offer is auto-resolved, floored at zero.
    #[must_use]
    pub fn remaining_delay(&self, delay: Duration, now: DateTime<Utc>) -> Duration {
        let elapsed = (now - self.created_at).to_std().unwrap_or(Duration::ZERO);
        delay.saturating_sub(elapsed)
    }

    /// Whether a pending offer has outlived `ttl`.
    #[must_use]
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        (now - self.created_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(created_at: DateTime<Utc>) -> Offer {
        Offer {
            id: OfferId::new(1),
            user_id: UserId::new(2),
            stock_item_id: Some(StockItemId::new(3)),
            product_name: "iPhone 13 Pro 256GB".to_string(),
            offer_price: Decimal::from(270),
            list_price: Decimal::from(300),
            quantity: 5,
            status: OfferStatus::Pending,
            created_at,
            resolved_at: None,
            decided_by: None,
        }
    }

    #[test]
    fn test_remaining_delay_counts_down_and_floors_at_zero() {
        let now = Utc::now();
        let delay = Duration::from_secs(30);

        let fresh = offer(now - chrono::Duration::seconds(10));
        assert_eq!(fresh.remaining_delay(delay, now), Duration::from_secs(20));

        let overdue = offer(now - chrono::Duration::minutes(5));
        assert_eq!(overdue.remaining_delay(delay, now), Duration::ZERO);

        // Clock skew: created in the future still waits the full delay.
        let future = offer(now + chrono::Duration::seconds(5));
        assert_eq!(future.remaining_delay(delay, now), delay);
    }

    #[test]
    fn test_is_stale() {
        let now = Utc::now();
        let ttl = Duration::from_secs(24 * 60 * 60);

        assert!(!offer(now - chrono::Duration::hours(23)).is_stale(ttl, now));
        assert!(offer(now - chrono::Duration::hours(25)).is_stale(ttl, now));
    }

    #[test]
    fn test_terms_carry_prices() {
        let terms = offer(Utc::now()).terms();
        assert_eq!(terms.savings(), Decimal::from(150));
    }
}
