//! Aggregate counts for the admin dashboard.

use serde::Serialize;
use sqlx::PgPool;

use uephone_core::OrderStatus;

use super::{RepositoryError, parse_column};

#[derive(Debug, sqlx::FromRow)]
struct StockCountsRow {
    stock_items: i64,
    units_in_stock: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct StatusCountRow {
    status: String,
    count: i64,
}

/// Orders per status. Statuses with no orders report zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrdersByStatus {
    pub pending: i64,
    pub paid: i64,
    pub shipped: i64,
    pub delivered: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub stock_items: i64,
    pub units_in_stock: i64,
    pub pending_offers: i64,
    pub orders_by_status: OrdersByStatus,
    pub unread_conversations: i64,
}

/// Read-only repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    /// Returns `RepositoryError::DataCorruption` for an unknown order status.
    pub async fn counts(&self) -> Result<DashboardCounts, RepositoryError> {
        let stock = sqlx::query_as::<_, StockCountsRow>(
            r"
            SELECT COUNT(*) AS stock_items,
                   COALESCE(SUM(quantity), 0)::BIGINT AS units_in_stock
            FROM shop.stock_item
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let pending_offers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.offer WHERE status = 'pending'")
                .fetch_one(self.pool)
                .await?;

        let status_rows = sqlx::query_as::<_, StatusCountRow>(
            "SELECT status, COUNT(*) AS count FROM shop.customer_order GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        let unread_conversations: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(DISTINCT conversation_id)
            FROM shop.chat_message
            WHERE NOT is_admin_reply AND NOT is_read
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let mut orders_by_status = OrdersByStatus::default();
        for row in status_rows {
            let slot = match parse_column::<OrderStatus>(&row.status, "order status")? {
                OrderStatus::Pending => &mut orders_by_status.pending,
                OrderStatus::Paid => &mut orders_by_status.paid,
                OrderStatus::Shipped => &mut orders_by_status.shipped,
                OrderStatus::Delivered => &mut orders_by_status.delivered,
                OrderStatus::Cancelled => &mut orders_by_status.cancelled,
            };
            *slot = row.count;
        }

        Ok(DashboardCounts {
            stock_items: stock.stock_items,
            units_in_stock: stock.units_in_stock,
            pending_offers,
            orders_by_status,
            unread_conversations,
        })
    }
}
