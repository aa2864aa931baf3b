//! Manually confirmed payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use uephone_core::{OrderId, PaymentId, PaymentMethod, PaymentStatus};

/// A payment recorded against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
    /// Always the order total at the time the payment was created.
    pub amount: Decimal,
    pub status: PaymentStatus,
    /// Reference the customer supplied, such as a bank transfer id.
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}
