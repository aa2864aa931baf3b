//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use uephone_core::{CartTotals, OrderId, OrderItemId, OrderStatus, StockItemId, UserId};

use super::{RepositoryError, parse_column};
use crate::models::order::{Order, OrderItem, ShippingAddress};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    subtotal_amount: Decimal,
    shipping_amount: Decimal,
    total_amount: Decimal,
    status: String,
    tracking_number: Option<String>,
    shipping_address: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let shipping_address = row
            .shipping_address
            .map(serde_json::from_value::<ShippingAddress>)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid shipping address in database: {e}"))
            })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            subtotal_amount: row.subtotal_amount,
            shipping_amount: row.shipping_amount,
            total_amount: row.total_amount,
            status: parse_column(&row.status, "order status")?,
            tracking_number: row.tracking_number,
            shipping_address,
            created_at: row.created_at,
            paid_at: row.paid_at,
            shipped_at: row.shipped_at,
            delivered_at: row.delivered_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    stock_item_id: Option<i32>,
    name: String,
    quantity: i32,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            stock_item_id: row.stock_item_id.map(StockItemId::new),
            name: row.name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, subtotal_amount, shipping_amount, total_amount, status, \
     tracking_number, shipping_address, created_at, paid_at, shipped_at, delivered_at, cancelled_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        get(self.pool, id).await
    }

    /// Look up a paid order by its tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE tracking_number = $1"
        ))
        .bind(tracking_number)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM shop.customer_order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Items of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        items(self.pool, order_id).await
    }
}

// =============================================================================
// Executor-generic operations (used inside checkout and payment transactions)
// =============================================================================

/// Get an order through any executor.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get<'e>(
    executor: impl PgExecutor<'e>,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(Order::try_from).transpose()
}

/// Lock an order row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock<'e>(
    executor: impl PgExecutor<'e>,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(Order::try_from).transpose()
}

/// Items of an order through any executor.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn items<'e>(
    executor: impl PgExecutor<'e>,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, order_id, stock_item_id, name, quantity, price
        FROM shop.order_item
        WHERE order_id = $1
        ORDER BY id
        ",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(OrderItem::from).collect())
}

/// Insert a pending order carrying server-computed totals.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    user_id: UserId,
    totals: &CartTotals,
    shipping_address: Option<&ShippingAddress>,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        INSERT INTO shop.customer_order (
            user_id, subtotal_amount, shipping_amount, total_amount, status, shipping_address
        )
        VALUES ($1, $2, $3, $4, 'pending', $5)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(totals.subtotal)
    .bind(totals.shipping)
    .bind(totals.total)
    .bind(shipping_address.map(Json))
    .fetch_one(executor)
    .await?;

    row.try_into()
}

/// Insert one order line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item<'e>(
    executor: impl PgExecutor<'e>,
    order_id: OrderId,
    stock_item_id: StockItemId,
    name: &str,
    quantity: i32,
    price: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.order_item (order_id, stock_item_id, name, quantity, price)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(order_id)
    .bind(stock_item_id)
    .bind(name)
    .bind(quantity)
    .bind(price)
    .execute(executor)
    .await?;

    Ok(())
}

/// Set an order's status and stamp the matching lifecycle timestamp.
///
/// Assigns `tracking_number` when given, leaving any existing one otherwise.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist.
/// Returns `RepositoryError::Conflict` if the tracking number is taken.
pub async fn set_status<'e>(
    executor: impl PgExecutor<'e>,
    id: OrderId,
    status: OrderStatus,
    tracking_number: Option<&str>,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        UPDATE shop.customer_order
        SET status = $2,
            tracking_number = COALESCE($3, tracking_number),
            paid_at = CASE WHEN $2 = 'paid' THEN NOW() ELSE paid_at END,
            shipped_at = CASE WHEN $2 = 'shipped' THEN NOW() ELSE shipped_at END,
            delivered_at = CASE WHEN $2 = 'delivered' THEN NOW() ELSE delivered_at END,
            cancelled_at = CASE WHEN $2 = 'cancelled' THEN NOW() ELSE cancelled_at END
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(tracking_number)
    .fetch_optional(executor)
    .await
    .map_err(|e| RepositoryError::unique_violation(e, "tracking number already assigned"))?;

    row.ok_or(RepositoryError::NotFound)?.try_into()
}
