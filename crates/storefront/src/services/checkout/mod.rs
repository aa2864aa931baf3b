//! Checkout, manual payments and order fulfilment.
//!
//! Placing an order and confirming a payment each run in one transaction.
//! Stock rows are locked in id order before they are decremented, so two
//! checkouts for the same phone serialize instead of overselling.

mod error;

pub use error::CheckoutError;

use std::collections::BTreeMap;

use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use uephone_core::{
    CartLineId, CartTotals, OrderId, OrderStatus, PaymentId, PaymentMethod, ShippingPolicy, StockItemId,
    UserId, tracking_number,
};

use crate::db::{PaymentRepository, cart, orders, payments, stock};
use crate::models::{CurrentUser, Order, Payment, ShippingAddress};
use crate::services::telegram::{Notification, NotificationLine, Notifier};

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    notifier: &'a Notifier,
    shipping: ShippingPolicy,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, notifier: &'a Notifier, shipping: ShippingPolicy) -> Self {
        Self {
            pool,
            notifier,
            shipping,
        }
    }

    /// Turn the caller's cart into a pending order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::BelowMinimum`
    /// for carts that cannot be ordered, and
    /// `CheckoutError::InsufficientStock` if any phone ran out.
    #[instrument(skip(self, user, shipping_address), fields(user_id = %user.id))]
    pub async fn place_order(
        &self,
        user: &CurrentUser,
        shipping_address: Option<ShippingAddress>,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        // Lines added after this point stay in the cart for the next order
        let cart = cart::lock(&mut tx, user.id).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let totals = CartTotals::compute(&cart, &self.shipping);
        if !totals.minimum_order_met {
            return Err(CheckoutError::BelowMinimum {
                required: self.shipping.minimum_quantity,
                actual: totals.total_items,
            });
        }

        let mut requested: BTreeMap<StockItemId, i64> = BTreeMap::new();
        for line in &cart.lines {
            *requested.entry(line.stock_item_id).or_default() += i64::from(line.quantity);
        }
        let ids: Vec<StockItemId> = requested.keys().copied().collect();
        let locked = stock::lock_for_update(&mut tx, &ids).await?;

        for (&item, &quantity) in &requested {
            let available = locked
                .iter()
                .find(|stock_item| stock_item.id == item)
                .map_or(0, |stock_item| stock_item.quantity);
            if i64::from(available) < quantity {
                warn!(item = %item, available, requested = quantity, "Insufficient stock");
                return Err(CheckoutError::InsufficientStock {
                    item,
                    available,
                    requested: quantity,
                });
            }
            // Bounded by `available`, which is an i32.
            let delta = i32::try_from(quantity).unwrap_or(available);
            stock::adjust_quantity(&mut tx, item, -delta).await?;
        }

        let order = orders::insert(&mut *tx, user.id, &totals, shipping_address.as_ref()).await?;
        for line in &cart.lines {
            orders::insert_item(
                &mut *tx,
                order.id,
                line.stock_item_id,
                &line.name,
                line.quantity,
                line.unit_price,
            )
            .await?;
        }
        let ordered: Vec<CartLineId> = cart.lines.iter().map(|line| line.id).collect();
        cart::remove_lines(&mut *tx, user.id, &ordered).await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            total = %order.total_amount,
            items = totals.total_items,
            "Order placed"
        );

        self.notifier.notify(Notification::OrderPlaced {
            order_id: order.id,
            customer_email: user.email.to_string(),
            lines: cart
                .lines
                .iter()
                .map(|line| NotificationLine {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    offered_quantity: line.offered_quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            total: totals.total,
            shipping_address,
        });

        Ok(order)
    }

    /// Record a pending payment for the full total of the caller's order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` unless `user_id` owns a pending
    /// order with this id.
    #[instrument(skip(self, transaction_id))]
    pub async fn create_payment(
        &self,
        user_id: UserId,
        order_id: OrderId,
        method: PaymentMethod,
        transaction_id: Option<&str>,
    ) -> Result<Payment, CheckoutError> {
        let order = orders::get(self.pool, order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or(CheckoutError::OrderNotFound)?;
        if order.status != OrderStatus::Pending {
            return Err(CheckoutError::OrderNotPending(order.status));
        }

        let payment = PaymentRepository::new(self.pool)
            .create(order.id, method, order.total_amount, transaction_id)
            .await?;

        info!(payment_id = %payment.id, amount = %payment.amount, "Payment recorded");
        Ok(payment)
    }

    /// Complete a pending payment, mark its order paid and assign the
    /// tracking number.
    ///
    /// `owner` restricts the payment to one customer's orders; `None` is an
    /// admin acting on any order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::PaymentNotFound` if there is no such payment
    /// visible to `owner`, `CheckoutError::PaymentNotPending` if it was
    /// already confirmed, and `CheckoutError::OrderNotPending` if the order
    /// moved on.
    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        payment_id: PaymentId,
        owner: Option<UserId>,
    ) -> Result<(Payment, Order), CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let payment = payments::lock(&mut *tx, payment_id)
            .await?
            .ok_or(CheckoutError::PaymentNotFound)?;
        let order = orders::lock(&mut *tx, payment.order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if owner.is_some_and(|user_id| user_id != order.user_id) {
            return Err(CheckoutError::PaymentNotFound);
        }
        if order.status != OrderStatus::Pending {
            return Err(CheckoutError::OrderNotPending(order.status));
        }

        let payment = payments::complete(&mut *tx, payment_id)
            .await?
            .ok_or(CheckoutError::PaymentNotPending)?;
        let tracking = tracking_number(order.id);
        let order = orders::set_status(&mut *tx, order.id, OrderStatus::Paid, Some(&tracking)).await?;

        tx.commit().await?;

        info!(order_id = %order.id, tracking_number = %tracking, "Payment confirmed");

        self.notifier.notify(Notification::PaymentConfirmed {
            order_id: order.id,
            amount: payment.amount,
            payment_method: payment.payment_method,
            tracking_number: tracking,
        });

        Ok((payment, order))
    }

    /// Move an order along its lifecycle. Cancelling puts its units back in
    /// stock.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order does not exist and
    /// `CheckoutError::InvalidTransition` for moves the lifecycle forbids.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let order = orders::lock(&mut *tx, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;
        if !order.status.can_transition_to(status) {
            return Err(CheckoutError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }

        if status == OrderStatus::Cancelled {
            restock(&mut tx, order_id).await?;
        }
        let updated = orders::set_status(&mut *tx, order_id, status, None).await?;

        tx.commit().await?;

        info!(from = %order.status, to = %updated.status, "Order status updated");
        Ok(updated)
    }
}

/// Return a cancelled order's units to stock. Lines whose phone was deleted
/// are skipped.
async fn restock(conn: &mut PgConnection, order_id: OrderId) -> Result<(), CheckoutError> {
    let mut returned: BTreeMap<StockItemId, i32> = BTreeMap::new();
    for item in orders::items(&mut *conn, order_id).await? {
        if let Some(stock_item_id) = item.stock_item_id {
            *returned.entry(stock_item_id).or_default() += item.quantity;
        }
    }

    let ids: Vec<StockItemId> = returned.keys().copied().collect();
    let existing = stock::lock_for_update(conn, &ids).await?;
    for stock_item in existing {
        if let Some(&quantity) = returned.get(&stock_item.id) {
            stock::adjust_quantity(conn, stock_item.id, quantity).await?;
        }
    }
    Ok(())
}

