//! Orders, order lines and the public tracking view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use uephone_core::{OrderId, OrderItemId, OrderStatus, StockItemId, UserId};

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub town: String,
    #[serde(default)]
    pub zip_code: String,
    pub street_address: String,
}

/// A placed order. Amounts are USD, computed server-side at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub subtotal_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// One line of an order, with the phone name as it was at purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the stock item has been removed from the catalogue.
    pub stock_item_id: Option<StockItemId>,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A lifecycle step shown on the tracking page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEvent {
    pub label: &'static str,
    pub at: DateTime<Utc>,
}

/// Public view of an order looked up by tracking number.
///
/// Carries no customer identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingView {
    pub tracking_number: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub events: Vec<TrackingEvent>,
}

impl TrackingView {
    /// Returns `None` for orders that have not been assigned a tracking number.
    #[must_use]
    pub fn from_order(order: &Order) -> Option<Self> {
        let tracking_number = order.tracking_number.clone()?;

        let events = [
            ("Order received", Some(order.created_at)),
            ("Payment confirmed", order.paid_at),
            ("Shipped", order.shipped_at),
            ("Delivered", order.delivered_at),
            ("Cancelled", order.cancelled_at),
        ]
        .into_iter()
        .filter_map(|(label, at)| at.map(|at| TrackingEvent { label, at }))
        .collect();

        Some(Self {
            tracking_number,
            status: order.status,
            status_label: order.status.label(),
            events,
        })
    }
}
