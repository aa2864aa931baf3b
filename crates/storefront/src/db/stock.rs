//! Stock catalogue repository.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgExecutor, PgPool};

use uephone_core::StockItemId;

use super::RepositoryError;
use crate::models::stock::{FacetCount, NewStockItem, StockFacets, StockFilter, StockItem, StockItemUpdate};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StockItemRow {
    id: i32,
    name: String,
    price: Decimal,
    quantity: i32,
    grade: String,
    location: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<StockItemRow> for StockItem {
    fn from(row: StockItemRow) -> Self {
        Self {
            id: StockItemId::new(row.id),
            name: row.name,
            price: row.price,
            quantity: row.quantity,
            grade: row.grade,
            location: row.location,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FacetRow {
    value: String,
    count: i64,
}

impl From<FacetRow> for FacetCount {
    fn from(row: FacetRow) -> Self {
        Self {
            value: row.value,
            count: row.count,
        }
    }
}

/// What a catalogue import changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Items inserted or updated.
    pub written: usize,
    /// Items no longer listed, now deleted.
    pub retired: usize,
}

const STOCK_COLUMNS: &str = "id, name, price, quantity, grade, location, image_url, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock catalogue operations.
pub struct StockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StockRepository<'a> {
    /// Create a new stock repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List items matching `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &StockFilter) -> Result<Vec<StockItem>, RepositoryError> {
        let name_pattern = filter
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));

        let rows = sqlx::query_as::<_, StockItemRow>(&format!(
            r"
            SELECT {STOCK_COLUMNS}
            FROM shop.stock_item
            WHERE ($1::text IS NULL OR grade = $1)
              AND ($2::text IS NULL OR location = $2)
              AND ($3::text IS NULL OR name ILIKE $3)
              AND ($4::numeric IS NULL OR price >= $4)
              AND ($5::numeric IS NULL OR price <= $5)
              AND (NOT $6 OR quantity > 0)
            ORDER BY id
            "
        ))
        .bind(filter.grade.as_deref())
        .bind(filter.location.as_deref())
        .bind(name_pattern)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.in_stock)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(StockItem::from).collect())
    }

    /// Get an item by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StockItemId) -> Result<Option<StockItem>, RepositoryError> {
        find(self.pool, id).await
    }

    /// Insert an item. Any id on `item` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, item: &NewStockItem) -> Result<StockItem, RepositoryError> {
        let row = sqlx::query_as::<_, StockItemRow>(&format!(
            r"
            INSERT INTO shop.stock_item (name, price, quantity, grade, location, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {STOCK_COLUMNS}
            "
        ))
        .bind(item.name.trim())
        .bind(item.price)
        .bind(item.quantity)
        .bind(&item.grade)
        .bind(&item.location)
        .bind(item.image_url.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: StockItemId,
        update: &StockItemUpdate,
    ) -> Result<StockItem, RepositoryError> {
        let row = sqlx::query_as::<_, StockItemRow>(&format!(
            r"
            UPDATE shop.stock_item
            SET name = COALESCE($2, name),
                price = COALESCE($3, price),
                quantity = COALESCE($4, quantity),
                grade = COALESCE($5, grade),
                location = COALESCE($6, location),
                image_url = COALESCE($7, image_url)
            WHERE id = $1
            RETURNING {STOCK_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.price)
        .bind(update.quantity)
        .bind(update.grade.as_deref())
        .bind(update.location.as_deref())
        .bind(update.image_url.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(StockItem::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete an item. Returns `false` if it did not exist.
    ///
    /// Pending offers on the item expire; resolved offers keep their history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: StockItemId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let removed = retire(&mut tx, &[id.as_i32()]).await?;
        tx.commit().await?;

        Ok(removed > 0)
    }

    /// Make the catalogue exactly `items` in one transaction.
    ///
    /// Items are written in place by id, so cart lines and offers on phones
    /// that stay listed survive the import. Phones missing from `items` are
    /// retired as by [`Self::delete`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if two items share an id.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn replace_all(&self, items: &[NewStockItem]) -> Result<ImportReport, RepositoryError> {
        check_distinct_ids(items)?;
        let mut tx = self.pool.begin().await?;

        let kept = write_items(&mut tx, items).await?;
        let missing: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM shop.stock_item WHERE id <> ALL($1) ORDER BY id FOR UPDATE",
        )
        .bind(&kept)
        .fetch_all(&mut *tx)
        .await?;
        let retired = retire(&mut tx, &missing).await?;

        tx.commit().await?;
        Ok(ImportReport {
            written: kept.len(),
            retired,
        })
    }

    /// Insert or update items by id, leaving the rest of the catalogue alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any write fails.
    pub async fn upsert_all(&self, items: &[NewStockItem]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let written = write_items(&mut tx, items).await?;
        tx.commit().await?;
        Ok(written.len())
    }

    /// Item counts per grade and per location.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn facets(&self) -> Result<StockFacets, RepositoryError> {
        let grades = sqlx::query_as::<_, FacetRow>(
            r"
            SELECT grade AS value, COUNT(*) AS count
            FROM shop.stock_item
            GROUP BY grade
            ORDER BY grade
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let locations = sqlx::query_as::<_, FacetRow>(
            r"
            SELECT location AS value, COUNT(*) AS count
            FROM shop.stock_item
            GROUP BY location
            ORDER BY location
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(StockFacets {
            grades: grades.into_iter().map(FacetCount::from).collect(),
            locations: locations.into_iter().map(FacetCount::from).collect(),
        })
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// Get an item through any executor, without locking it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find<'e>(
    executor: impl PgExecutor<'e>,
    id: StockItemId,
) -> Result<Option<StockItem>, RepositoryError> {
    let row = sqlx::query_as::<_, StockItemRow>(&format!(
        "SELECT {STOCK_COLUMNS} FROM shop.stock_item WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(StockItem::from))
}

/// Lock the given items for the rest of the transaction, in id order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_for_update(
    conn: &mut PgConnection,
    ids: &[StockItemId],
) -> Result<Vec<StockItem>, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(StockItemId::as_i32).collect();

    let rows = sqlx::query_as::<_, StockItemRow>(&format!(
        r"
        SELECT {STOCK_COLUMNS}
        FROM shop.stock_item
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "
    ))
    .bind(ids)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(StockItem::from).collect())
}

/// Add `delta` (which may be negative) to an item's quantity.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails, including when
/// the result would go below zero.
pub async fn adjust_quantity(
    conn: &mut PgConnection,
    id: StockItemId,
    delta: i32,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.stock_item SET quantity = quantity + $2 WHERE id = $1")
        .bind(id)
        .bind(delta)
        .execute(conn)
        .await?;
    Ok(())
}

/// Write items with explicit ids first, then move the id sequence past them
/// and insert the rest. Returns the id of every written item.
async fn write_items(
    conn: &mut PgConnection,
    items: &[NewStockItem],
) -> Result<Vec<i32>, RepositoryError> {
    let mut written = Vec::with_capacity(items.len());
    for item in items.iter().filter(|item| item.id.is_some()) {
        written.push(upsert_item(&mut *conn, item).await?);
    }
    reset_id_sequence(&mut *conn).await?;
    for item in items.iter().filter(|item| item.id.is_none()) {
        written.push(upsert_item(&mut *conn, item).await?);
    }
    Ok(written)
}

async fn upsert_item(conn: &mut PgConnection, item: &NewStockItem) -> Result<i32, RepositoryError> {
    let id = sqlx::query_scalar(
        r"
        INSERT INTO shop.stock_item (id, name, price, quantity, grade, location, image_url)
        VALUES (
            COALESCE($1, nextval(pg_get_serial_sequence('shop.stock_item', 'id'))),
            $2, $3, $4, $5, $6, $7
        )
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            price = EXCLUDED.price,
            quantity = EXCLUDED.quantity,
            grade = EXCLUDED.grade,
            location = EXCLUDED.location,
            image_url = EXCLUDED.image_url
        RETURNING id
        ",
    )
    .bind(item.id)
    .bind(item.name.trim())
    .bind(item.price)
    .bind(item.quantity)
    .bind(&item.grade)
    .bind(&item.location)
    .bind(item.image_url.as_deref())
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Expire pending offers on `ids`, then delete the items. Cart lines go with
/// them; offers and order lines keep their rows.
async fn retire(conn: &mut PgConnection, ids: &[i32]) -> Result<usize, RepositoryError> {
    if ids.is_empty() {
        return Ok(0);
    }

    sqlx::query(
        r"
        UPDATE shop.offer
        SET status = 'expired', resolved_by = 'expiry', resolved_at = NOW()
        WHERE status = 'pending' AND stock_item_id = ANY($1)
        ",
    )
    .bind(ids)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query("DELETE FROM shop.stock_item WHERE id = ANY($1)")
        .bind(ids)
        .execute(conn)
        .await?;

    Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
}

fn check_distinct_ids(items: &[NewStockItem]) -> Result<(), RepositoryError> {
    let mut seen = HashSet::with_capacity(items.len());
    if items.iter().filter_map(|item| item.id).all(|id| seen.insert(id)) {
        Ok(())
    } else {
        Err(RepositoryError::Conflict("duplicate stock item id".to_owned()))
    }
}

async fn reset_id_sequence(conn: &mut PgConnection) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        SELECT setval(
            pg_get_serial_sequence('shop.stock_item', 'id'),
            COALESCE((SELECT MAX(id) FROM shop.stock_item), 0) + 1,
            false
        )
        ",
    )
    .execute(conn)
    .await?;
    Ok(())
}

/// Escape `ILIKE` wildcards in user input.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_item(id: Option<i32>) -> NewStockItem {
        NewStockItem {
            id: id.map(StockItemId::new),
            name: "Galaxy S22 128GB".to_string(),
            price: Decimal::new(31_000, 2),
            quantity: 4,
            grade: "B".to_string(),
            location: "Dubai".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_import_rejects_duplicate_ids() {
        let items = [import_item(Some(3)), import_item(None), import_item(Some(3))];
        assert!(matches!(
            check_distinct_ids(&items),
            Err(RepositoryError::Conflict(message)) if message == "duplicate stock item id"
        ));
    }

    #[test]
    fn test_import_allows_many_items_without_ids() {
        let items = [import_item(None), import_item(Some(3)), import_item(None)];
        assert!(check_distinct_ids(&items).is_ok());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("iphone 13"), "iphone 13");
        assert_eq!(escape_like("100%_new\\"), "100\\%\\_new\\\\");
    }
}
