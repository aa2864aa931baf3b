//! Shipment tracking numbers.
//!
//! A tracking number is assigned when payment is confirmed and is derived
//! from the order id: `UEP` followed by the id zero-padded to 8 digits.

use super::id::OrderId;

/// Prefix on every tracking number.
pub const TRACKING_PREFIX: &str = "UEP";

const DIGITS: usize = 8;

/// Build the tracking number for an order.
///
/// ```
/// use uephone_core::{OrderId, tracking_number};
///
/// assert_eq!(tracking_number(OrderId::new(42)), "UEP00000042");
/// ```
#[must_use]
pub fn tracking_number(order_id: OrderId) -> String {
    format!("{TRACKING_PREFIX}{:0width$}", order_id.as_i32(), width = DIGITS)
}

/// Recover the order id from a tracking number.
///
/// Only the exact `UEP` + 8 digits shape is accepted.
#[must_use]
pub fn parse_tracking_number(s: &str) -> Option<OrderId> {
    let digits = s.strip_prefix(TRACKING_PREFIX)?;
    if digits.len() != DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i32>().ok().map(OrderId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_number_pads() {
        assert_eq!(tracking_number(OrderId::new(1)), "UEP00000001");
        assert_eq!(tracking_number(OrderId::new(12_345_678)), "UEP12345678");
    }

    #[test]
    fn test_parse_inverse() {
        assert_eq!(parse_tracking_number("UEP00000042"), Some(OrderId::new(42)));
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert_eq!(parse_tracking_number("UEP42"), None);
        assert_eq!(parse_tracking_number("uep00000042"), None);
        assert_eq!(parse_tracking_number("UEP0000004a"), None);
        assert_eq!(parse_tracking_number("UEP+0000042"), None);
        assert_eq!(parse_tracking_number("XYZ00000042"), None);
    }
}
