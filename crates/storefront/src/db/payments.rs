//! Payment repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use uephone_core::{OrderId, PaymentId, PaymentMethod};

use super::{RepositoryError, parse_column};
use crate::models::payment::Payment;

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    order_id: i32,
    payment_method: String,
    amount: Decimal,
    status: String,
    transaction_id: Option<String>,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PaymentId::new(row.id),
            order_id: OrderId::new(row.order_id),
            payment_method: parse_column(&row.payment_method, "payment method")?,
            amount: row.amount,
            status: parse_column(&row.status, "payment status")?,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
        })
    }
}

const PAYMENT_COLUMNS: &str =
    "id, order_id, payment_method, amount, status, transaction_id, created_at, confirmed_at";

/// Repository for payments.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a pending payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
        amount: Decimal,
        transaction_id: Option<&str>,
    ) -> Result<Payment, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            INSERT INTO shop.payment (order_id, payment_method, amount, status, transaction_id)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(method.as_str())
        .bind(amount)
        .bind(transaction_id)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM shop.payment WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    /// The most recent payment recorded for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            SELECT {PAYMENT_COLUMNS}
            FROM shop.payment
            WHERE order_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }
}

/// Lock a payment row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock<'e>(
    executor: impl PgExecutor<'e>,
    id: PaymentId,
) -> Result<Option<Payment>, RepositoryError> {
    let row = sqlx::query_as::<_, PaymentRow>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM shop.payment WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(Payment::try_from).transpose()
}

/// Mark a pending payment completed.
///
/// Returns `None` if the payment was not pending.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn complete<'e>(
    executor: impl PgExecutor<'e>,
    id: PaymentId,
) -> Result<Option<Payment>, RepositoryError> {
    let row = sqlx::query_as::<_, PaymentRow>(&format!(
        r"
        UPDATE shop.payment
        SET status = 'completed', confirmed_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {PAYMENT_COLUMNS}
        "
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(Payment::try_from).transpose()
}
