//! Offer repository.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use uephone_core::{OfferId, OfferStatus, OfferTerms, ResolvedBy, StockItemId, UserId};

use super::{RepositoryError, parse_column};
use crate::models::offer::Offer;
use crate::models::stock::StockItem;

#[derive(Debug, sqlx::FromRow)]
struct OfferRow {
    id: i32,
    user_id: i32,
    stock_item_id: Option<i32>,
    product_name: String,
    offer_price: Decimal,
    list_price: Decimal,
    quantity: i32,
    status: String,
    resolved_by: Option<String>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = RepositoryError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OfferId::new(row.id),
            user_id: UserId::new(row.user_id),
            stock_item_id: row.stock_item_id.map(StockItemId::new),
            product_name: row.product_name,
            offer_price: row.offer_price,
            list_price: row.list_price,
            quantity: row.quantity,
            status: parse_column(&row.status, "offer status")?,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
            decided_by: row
                .resolved_by
                .as_deref()
                .map(|r| parse_column(r, "offer resolver"))
                .transpose()?,
        })
    }
}

const OFFER_COLUMNS: &str = "id, user_id, stock_item_id, product_name, offer_price, list_price, \
     quantity, status, resolved_by, created_at, resolved_at";

fn into_offers(rows: Vec<OfferRow>) -> Result<Vec<Offer>, RepositoryError> {
    rows.into_iter().map(Offer::try_from).collect()
}

/// Repository for price offers.
pub struct OfferRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OfferRepository<'a> {
    /// Create a new offer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new pending offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        item: &StockItem,
        terms: &OfferTerms,
    ) -> Result<Offer, RepositoryError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            INSERT INTO shop.offer
                (user_id, stock_item_id, product_name, offer_price, list_price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {OFFER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(item.id)
        .bind(&item.name)
        .bind(terms.offer_price)
        .bind(terms.list_price)
        .bind(terms.quantity)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get an offer by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM shop.offer WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Offer::try_from).transpose()
    }

    /// Get an offer only if `user_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: OfferId,
        user_id: UserId,
    ) -> Result<Option<Offer>, RepositoryError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM shop.offer WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Offer::try_from).transpose()
    }

    /// A customer's offers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            SELECT {OFFER_COLUMNS}
            FROM shop.offer
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        into_offers(rows)
    }

    /// All offers, optionally filtered by status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<OfferStatus>) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            SELECT {OFFER_COLUMNS}
            FROM shop.offer
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status.map(OfferStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        into_offers(rows)
    }

    /// Pending offers, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            SELECT {OFFER_COLUMNS}
            FROM shop.offer
            WHERE status = 'pending'
            ORDER BY created_at, id
            "
        ))
        .fetch_all(self.pool)
        .await?;

        into_offers(rows)
    }

    /// Expire every pending offer older than `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn expire_stale(&self, ttl: Duration) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            UPDATE shop.offer
            SET status = 'expired', resolved_by = 'expiry', resolved_at = NOW()
            WHERE status = 'pending'
              AND created_at <= NOW() - make_interval(secs => $1)
            RETURNING {OFFER_COLUMNS}
            "
        ))
        .bind(ttl.as_secs_f64())
        .fetch_all(self.pool)
        .await?;

        into_offers(rows)
    }
}

/// Move a pending offer to `status`.
///
/// Returns `None` when the offer was no longer pending, so exactly one caller
/// wins a race between the timer, an admin and the customer.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn resolve<'e>(
    executor: impl PgExecutor<'e>,
    id: OfferId,
    status: OfferStatus,
    resolved_by: ResolvedBy,
) -> Result<Option<Offer>, RepositoryError> {
    let row = sqlx::query_as::<_, OfferRow>(&format!(
        r"
        UPDATE shop.offer
        SET status = $2, resolved_by = $3, resolved_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {OFFER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(resolved_by.as_str())
    .fetch_optional(executor)
    .await?;

    row.map(Offer::try_from).transpose()
}
