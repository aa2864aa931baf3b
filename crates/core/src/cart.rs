//! Cart arithmetic.
//!
//! The storefront persists cart lines per customer; this module owns the rules
//! for merging lines and computing totals so both the HTTP handlers and the
//! offer resolver agree on them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartLineId, Currency, OfferId, StockItemId, round_money};

/// One line in a customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub stock_item_id: StockItemId,
    pub name: String,
    pub grade: String,
    pub location: String,
    /// Price per unit in USD. List price, or the accepted offer price.
    pub unit_price: Decimal,
    pub quantity: i32,
    /// Set when the line came from an accepted offer.
    pub offer_id: Option<OfferId>,
    /// Units the accepted offers on this line were made for. The customer
    /// may have changed `quantity` since.
    pub offered_quantity: Option<i32>,
    pub image_url: Option<String>,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Lines merge when they are the same phone at the same unit price.
    #[must_use]
    pub fn merges_with(&self, stock_item_id: StockItemId, unit_price: Decimal) -> bool {
        self.stock_item_id == stock_item_id && self.unit_price == unit_price
    }
}

/// What [`Cart::add`] did with the incoming line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Quantity was added to an existing line.
    Merged {
        line_id: CartLineId,
        new_quantity: i32,
    },
    /// The line was appended.
    Appended,
}

/// A customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Add a line, merging quantities into a line for the same phone at the
    /// same unit price. List-price and offer-price lines stay separate.
    pub fn add(&mut self, line: CartLine) -> AddOutcome {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|existing| existing.merges_with(line.stock_item_id, line.unit_price))
        {
            existing.quantity += line.quantity;
            existing.offer_id = existing.offer_id.or(line.offer_id);
            existing.offered_quantity = match (existing.offered_quantity, line.offered_quantity) {
                (Some(held), Some(incoming)) => Some(held + incoming),
                (held, incoming) => held.or(incoming),
            };
            return AddOutcome::Merged {
                line_id: existing.id,
                new_quantity: existing.quantity,
            };
        }
        self.lines.push(line);
        AddOutcome::Appended
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// Returns `false` if no line has that id.
    pub fn update_quantity(&mut self, line_id: CartLineId, quantity: i32) -> bool {
        if quantity <= 0 {
            return self.remove(line_id);
        }
        match self.lines.iter_mut().find(|line| line.id == line_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` if no line has that id.
    pub fn remove(&mut self, line_id: CartLineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != line_id);
        self.lines.len() != before
    }

    /// The line with `line_id`, if the cart has one.
    #[must_use]
    pub fn line(&self, line_id: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == line_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn unique_items(&self) -> usize {
        self.lines.len()
    }

    /// Units of one stock item across every line (list and offer price).
    #[must_use]
    pub fn quantity_of(&self, stock_item_id: StockItemId) -> i64 {
        self.lines
            .iter()
            .filter(|line| line.stock_item_id == stock_item_id)
            .map(|line| i64::from(line.quantity))
            .sum()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

/// Shipping charge and minimum order size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Flat charge applied to any non-empty cart.
    pub flat_rate: Decimal,
    /// Fewest units an order may contain.
    pub minimum_quantity: i64,
}

impl ShippingPolicy {
    #[must_use]
    pub fn shipping_for(&self, cart: &Cart) -> Decimal {
        if cart.is_empty() {
            Decimal::ZERO
        } else {
            self.flat_rate
        }
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            flat_rate: Decimal::from(25),
            minimum_quantity: 5,
        }
    }
}

/// Server-computed cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub total_items: i64,
    pub unique_items: usize,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub minimum_order_met: bool,
}

impl CartTotals {
    #[must_use]
    pub fn compute(cart: &Cart, policy: &ShippingPolicy) -> Self {
        let subtotal = round_money(cart.subtotal());
        let shipping = policy.shipping_for(cart);
        let total_items = cart.total_items();
        Self {
            total_items,
            unique_items: cart.unique_items(),
            subtotal,
            shipping,
            total: subtotal + shipping,
            minimum_order_met: total_items >= policy.minimum_quantity,
        }
    }

    /// Totals rendered in a display currency.
    #[must_use]
    pub fn formatted(&self, currency: Currency) -> FormattedTotals {
        FormattedTotals {
            currency,
            subtotal: currency.format(self.subtotal),
            shipping: currency.format(self.shipping),
            total: currency.format(self.total),
        }
    }
}

/// [`CartTotals`] formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTotals {
    pub currency: Currency,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, item: i32, price: i64, quantity: i32) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            stock_item_id: StockItemId::new(item),
            name: format!("iPhone 13 Pro #{item}"),
            grade: "A+/A".to_owned(),
            location: "HongKong".to_owned(),
            unit_price: Decimal::from(price),
            quantity,
            offer_id: None,
            offered_quantity: None,
            image_url: None,
        }
    }

    #[test]
    fn test_add_merges_same_item_and_price() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(line(1, 10, 300, 2)), AddOutcome::Appended);
        let outcome = cart.add(line(2, 10, 300, 3));

        assert_eq!(
            outcome,
            AddOutcome::Merged {
                line_id: CartLineId::new(1),
                new_quantity: 5
            }
        );
        assert_eq!(cart.unique_items(), 1);
        assert_eq!(cart.total_items(), 5);
    }

    #[test]
    fn test_offer_priced_line_stays_separate() {
        let mut cart = Cart::default();
        cart.add(line(1, 10, 300, 2));
        let mut offer_line = line(2, 10, 270, 4);
        offer_line.offer_id = Some(OfferId::new(9));

        assert_eq!(cart.add(offer_line), AddOutcome::Appended);
        assert_eq!(cart.unique_items(), 2);
        assert_eq!(cart.quantity_of(StockItemId::new(10)), 6);
        assert_eq!(cart.subtotal(), Decimal::from(300 * 2 + 270 * 4));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new(vec![line(1, 10, 300, 2), line(2, 11, 150, 1)]);

        assert!(cart.update_quantity(CartLineId::new(1), 7));
        assert_eq!(cart.total_items(), 8);

        assert!(cart.update_quantity(CartLineId::new(2), 0));
        assert_eq!(cart.unique_items(), 1);

        assert!(cart.update_quantity(CartLineId::new(1), -3));
        assert!(cart.is_empty());

        assert!(!cart.update_quantity(CartLineId::new(99), 1));
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new(vec![line(1, 10, 300, 2), line(2, 11, 150, 1)]);
        assert!(cart.remove(CartLineId::new(2)));
        assert!(!cart.remove(CartLineId::new(2)));
        assert!(cart.line(CartLineId::new(2)).is_none());
        assert_eq!(cart.line(CartLineId::new(1)).map(|l| l.quantity), Some(2));
    }

    #[test]
    fn test_merging_offer_lines_sums_offered_quantity() {
        let mut first = line(1, 10, 270, 4);
        first.offer_id = Some(OfferId::new(5));
        first.offered_quantity = Some(4);
        let mut second = line(0, 10, 270, 6);
        second.offer_id = Some(OfferId::new(6));
        second.offered_quantity = Some(6);

        let mut cart = Cart::new(vec![first]);
        cart.add(second);

        let merged = cart.line(CartLineId::new(1)).unwrap();
        assert_eq!(merged.quantity, 10);
        assert_eq!(merged.offer_id, Some(OfferId::new(5)));
        assert_eq!(merged.offered_quantity, Some(10));
    }

    #[test]
    fn test_offer_at_list_price_merges_into_list_line() {
        let mut cart = Cart::new(vec![line(1, 10, 300, 5)]);
        let mut offer_line = line(0, 10, 300, 10);
        offer_line.offer_id = Some(OfferId::new(2));
        offer_line.offered_quantity = Some(10);

        assert_eq!(
            cart.add(offer_line),
            AddOutcome::Merged {
                line_id: CartLineId::new(1),
                new_quantity: 15
            }
        );
        let merged = cart.line(CartLineId::new(1)).unwrap();
        assert_eq!(merged.offer_id, Some(OfferId::new(2)));
        assert_eq!(merged.offered_quantity, Some(10));
    }

    #[test]
    fn test_totals_with_flat_shipping() {
        let cart = Cart::new(vec![line(1, 10, 300, 2), line(2, 11, 150, 3)]);
        let totals = CartTotals::compute(&cart, &ShippingPolicy::default());

        assert_eq!(totals.subtotal, Decimal::from(1050));
        assert_eq!(totals.shipping, Decimal::from(25));
        assert_eq!(totals.total, Decimal::from(1075));
        assert_eq!(totals.total_items, 5);
        assert!(totals.minimum_order_met);
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let totals = CartTotals::compute(&Cart::default(), &ShippingPolicy::default());
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
        assert!(!totals.minimum_order_met);
    }

    #[test]
    fn test_minimum_order_not_met() {
        let cart = Cart::new(vec![line(1, 10, 300, 4)]);
        let totals = CartTotals::compute(&cart, &ShippingPolicy::default());
        assert!(!totals.minimum_order_met);
    }

    #[test]
    fn test_formatted_totals_in_eur() {
        let cart = Cart::new(vec![line(1, 10, 100, 5)]);
        let formatted = CartTotals::compute(&cart, &ShippingPolicy::default())
            .formatted(Currency::EUR);
        assert_eq!(formatted.subtotal, "€460.00");
        assert_eq!(formatted.shipping, "€23.00");
        assert_eq!(formatted.total, "€483.00");
    }
}
