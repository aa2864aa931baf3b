//! Offer pricing rules.
//!
//! A customer may offer a lower unit price for a quantity of one stock item.
//! [`OfferTerms`] validates the offer and computes the savings shown to both
//! sides; [`AutoAcceptPolicy`] decides offers nobody resolved by hand.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_money;

/// Reasons an offer is refused before it is stored.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OfferTermsError {
    #[error("quantity must be at least 1")]
    QuantityTooSmall,
    #[error("only {available} units available")]
    QuantityExceedsStock { available: i32 },
    #[error("offer price must be greater than zero")]
    NonPositivePrice,
    #[error("offer price cannot exceed the list price of {list_price}")]
    AboveListPrice { list_price: Decimal },
}

/// The numbers of an offer: what the phone lists at, what the customer
/// offers per unit, and how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub list_price: Decimal,
    pub offer_price: Decimal,
    pub quantity: i32,
}

impl OfferTerms {
    #[must_use]
    pub const fn new(list_price: Decimal, offer_price: Decimal, quantity: i32) -> Self {
        Self {
            list_price,
            offer_price,
            quantity,
        }
    }

    /// Suggested opening offer: 90% of the list price, rounded to cents.
    #[must_use]
    pub fn default_offer_price(list_price: Decimal) -> Decimal {
        round_money(list_price * Decimal::new(9, 1))
    }

    /// Check the offer against the units currently in stock.
    ///
    /// # Errors
    ///
    /// Returns the first rule the offer breaks.
    pub fn validate(&self, available: i32) -> Result<(), OfferTermsError> {
        if self.quantity < 1 {
            return Err(OfferTermsError::QuantityTooSmall);
        }
        if self.quantity > available {
            return Err(OfferTermsError::QuantityExceedsStock { available });
        }
        if self.offer_price <= Decimal::ZERO {
            return Err(OfferTermsError::NonPositivePrice);
        }
        if self.offer_price > self.list_price {
            return Err(OfferTermsError::AboveListPrice {
                list_price: self.list_price,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn original_total(&self) -> Decimal {
        self.list_price * Decimal::from(self.quantity)
    }

    #[must_use]
    pub fn offer_total(&self) -> Decimal {
        self.offer_price * Decimal::from(self.quantity)
    }

    #[must_use]
    pub fn savings(&self) -> Decimal {
        self.original_total() - self.offer_total()
    }

    /// Savings as a percentage of the original total, to one decimal place.
    #[must_use]
    pub fn savings_percent(&self) -> Decimal {
        let original = self.original_total();
        if original.is_zero() {
            return Decimal::ZERO;
        }
        (self.savings() / original * Decimal::ONE_HUNDRED).round_dp(1)
    }
}

/// Outcome of automatic offer resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferDecision {
    Accept,
    Reject,
}

/// Accepts offers at or above a fraction of the list price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAcceptPolicy {
    /// Lowest acceptable `offer_price / list_price`, in `(0, 1]`.
    pub floor_ratio: Decimal,
}

impl AutoAcceptPolicy {
    /// Default floor: 80% of list price.
    pub const DEFAULT_FLOOR_RATIO: Decimal = Decimal::from_parts(80, 0, 0, false, 2);

    #[must_use]
    pub const fn new(floor_ratio: Decimal) -> Self {
        Self { floor_ratio }
    }

    /// Lowest unit price this policy accepts for a list price.
    #[must_use]
    pub fn floor_price(&self, list_price: Decimal) -> Decimal {
        list_price * self.floor_ratio
    }

    #[must_use]
    pub fn decide(&self, terms: &OfferTerms) -> OfferDecision {
        if terms.offer_price >= self.floor_price(terms.list_price) {
            OfferDecision::Accept
        } else {
            OfferDecision::Reject
        }
    }
}

impl Default for AutoAcceptPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FLOOR_RATIO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(list: i64, offer: i64, quantity: i32) -> OfferTerms {
        OfferTerms::new(Decimal::from(list), Decimal::from(offer), quantity)
    }

    #[test]
    fn test_default_offer_price_is_ninety_percent() {
        assert_eq!(
            OfferTerms::default_offer_price(Decimal::from(999)),
            Decimal::new(89910, 2)
        );
        assert_eq!(
            OfferTerms::default_offer_price(Decimal::new(1999, 2)),
            Decimal::new(1799, 2)
        );
    }

    #[test]
    fn test_validate() {
        assert_eq!(terms(300, 270, 5).validate(10), Ok(()));
        assert_eq!(terms(300, 300, 10).validate(10), Ok(()));

        assert_eq!(
            terms(300, 270, 0).validate(10),
            Err(OfferTermsError::QuantityTooSmall)
        );
        assert_eq!(
            terms(300, 270, 11).validate(10),
            Err(OfferTermsError::QuantityExceedsStock { available: 10 })
        );
        assert_eq!(
            terms(300, 0, 1).validate(10),
            Err(OfferTermsError::NonPositivePrice)
        );
        assert_eq!(
            terms(300, 301, 1).validate(10),
            Err(OfferTermsError::AboveListPrice {
                list_price: Decimal::from(300)
            })
        );
    }

    #[test]
    fn test_savings() {
        let t = terms(1000, 900, 3);
        assert_eq!(t.original_total(), Decimal::from(3000));
        assert_eq!(t.offer_total(), Decimal::from(2700));
        assert_eq!(t.savings(), Decimal::from(300));
        assert_eq!(t.savings_percent(), Decimal::from(10));
    }

    #[test]
    fn test_savings_percent_rounds_and_handles_zero() {
        assert_eq!(terms(300, 200, 1).savings_percent(), Decimal::new(333, 1));
        assert_eq!(terms(0, 0, 1).savings_percent(), Decimal::ZERO);
    }

    #[test]
    fn test_auto_accept_floor() {
        let policy = AutoAcceptPolicy::default();
        assert_eq!(policy.floor_ratio, Decimal::new(80, 2));

        assert_eq!(policy.decide(&terms(500, 400, 1)), OfferDecision::Accept);
        assert_eq!(policy.decide(&terms(500, 450, 1)), OfferDecision::Accept);
        assert_eq!(policy.decide(&terms(500, 399, 1)), OfferDecision::Reject);
    }

    #[test]
    fn test_accept_all_policy() {
        let policy = AutoAcceptPolicy::new(Decimal::ZERO);
        assert_eq!(policy.decide(&terms(500, 1, 1)), OfferDecision::Accept);
    }
}
