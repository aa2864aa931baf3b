//! Persistent cart repository.
//!
//! Every write locks the customer's lines, applies the change to a
//! [`Cart`] and stores what changed. Lines are merged by
//! `(user_id, stock_item_id, unit_price)`, which is also the table's unique
//! key, so two first adds of the same line cannot split.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgExecutor, PgPool};

use uephone_core::{AddOutcome, Cart, CartLine, CartLineId, OfferId, StockItemId, UserId};

use super::RepositoryError;

const CART_QUERY: &str = r"
    SELECT c.id, c.stock_item_id, s.name, s.grade, s.location,
           c.unit_price, c.quantity, c.offer_id, c.offered_quantity,
           COALESCE(c.image_url, s.image_url) AS image_url
    FROM shop.cart_line c
    JOIN shop.stock_item s ON s.id = c.stock_item_id
    WHERE c.user_id = $1
    ORDER BY c.id
";

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    stock_item_id: i32,
    name: String,
    grade: String,
    location: String,
    unit_price: Decimal,
    quantity: i32,
    offer_id: Option<i32>,
    offered_quantity: Option<i32>,
    image_url: Option<String>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: CartLineId::new(row.id),
            stock_item_id: StockItemId::new(row.stock_item_id),
            name: row.name,
            grade: row.grade,
            location: row.location,
            unit_price: row.unit_price,
            quantity: row.quantity,
            offer_id: row.offer_id.map(OfferId::new),
            offered_quantity: row.offered_quantity,
            image_url: row.image_url,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    id: i32,
    quantity: i32,
    inserted: bool,
}

/// Repository for customer carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a customer's cart, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        load(self.pool, user_id).await
    }

    /// Add a line, merging into an existing line at the same unit price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn add(&self, user_id: UserId, line: CartLine) -> Result<AddOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let outcome = add(&mut tx, user_id, line).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Set a line's quantity; zero or less removes it.
    ///
    /// Returns `false` if the customer has no such line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut cart = lock(&mut tx, user_id).await?;
        if !cart.update_quantity(line_id, quantity) {
            return Ok(false);
        }

        match cart.line(line_id) {
            Some(line) => {
                sqlx::query("UPDATE shop.cart_line SET quantity = $3 WHERE id = $1 AND user_id = $2")
                    .bind(line_id)
                    .bind(user_id)
                    .bind(line.quantity)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {
                remove_lines(&mut *tx, user_id, &[line_id]).await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Remove a line. Returns `false` if the customer has no such line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user_id: UserId, line_id: CartLineId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut cart = lock(&mut tx, user_id).await?;
        if !cart.remove(line_id) {
            return Ok(false);
        }

        remove_lines(&mut *tx, user_id, &[line_id]).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Empty a customer's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let cart = lock(&mut tx, user_id).await?;
        let ids: Vec<CartLineId> = cart.lines.iter().map(|line| line.id).collect();
        let removed = remove_lines(&mut *tx, user_id, &ids).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

/// Load a cart through any executor, including an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn load<'e>(
    executor: impl PgExecutor<'e>,
    user_id: UserId,
) -> Result<Cart, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(CART_QUERY)
        .bind(user_id)
        .fetch_all(executor)
        .await?;

    Ok(Cart::new(rows.into_iter().map(CartLine::from).collect()))
}

/// Load a cart and lock its lines for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(conn: &mut PgConnection, user_id: UserId) -> Result<Cart, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(&format!("{CART_QUERY} FOR UPDATE OF c"))
        .bind(user_id)
        .fetch_all(conn)
        .await?;

    Ok(Cart::new(rows.into_iter().map(CartLine::from).collect()))
}

/// Add a line inside an open transaction.
///
/// A line for the same phone at the same unit price absorbs the quantity and
/// keeps its first `offer_id`; anything else becomes a new line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn add(
    conn: &mut PgConnection,
    user_id: UserId,
    line: CartLine,
) -> Result<AddOutcome, RepositoryError> {
    let mut cart = lock(&mut *conn, user_id).await?;
    let image_url = line.image_url.clone();

    match cart.add(line) {
        AddOutcome::Merged {
            line_id,
            new_quantity,
        } => {
            let merged = cart.line(line_id).ok_or(RepositoryError::NotFound)?;
            sqlx::query(
                r"
                UPDATE shop.cart_line
                SET quantity = $3,
                    offer_id = $4,
                    offered_quantity = $5,
                    image_url = COALESCE($6, image_url)
                WHERE id = $1 AND user_id = $2
                ",
            )
            .bind(line_id)
            .bind(user_id)
            .bind(new_quantity)
            .bind(merged.offer_id)
            .bind(merged.offered_quantity)
            .bind(image_url)
            .execute(&mut *conn)
            .await?;

            Ok(AddOutcome::Merged {
                line_id,
                new_quantity,
            })
        }
        AddOutcome::Appended => {
            let appended = cart.lines.last().ok_or(RepositoryError::NotFound)?;
            insert(conn, user_id, appended).await
        }
    }
}

/// Insert a new line. A concurrent first add of the same line lands in
/// `ON CONFLICT` and merges there.
async fn insert(
    conn: &mut PgConnection,
    user_id: UserId,
    line: &CartLine,
) -> Result<AddOutcome, RepositoryError> {
    let row = sqlx::query_as::<_, UpsertRow>(
        r"
        INSERT INTO shop.cart_line
            (user_id, stock_item_id, unit_price, quantity, offer_id, offered_quantity, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id, stock_item_id, unit_price) DO UPDATE
        SET quantity = shop.cart_line.quantity + EXCLUDED.quantity,
            offer_id = COALESCE(shop.cart_line.offer_id, EXCLUDED.offer_id),
            offered_quantity = NULLIF(
                COALESCE(shop.cart_line.offered_quantity, 0)
                    + COALESCE(EXCLUDED.offered_quantity, 0),
                0
            ),
            image_url = COALESCE(EXCLUDED.image_url, shop.cart_line.image_url)
        RETURNING id, quantity, (xmax = 0) AS inserted
        ",
    )
    .bind(user_id)
    .bind(line.stock_item_id)
    .bind(line.unit_price)
    .bind(line.quantity)
    .bind(line.offer_id)
    .bind(line.offered_quantity)
    .bind(line.image_url.as_deref())
    .fetch_one(conn)
    .await?;

    if row.inserted {
        Ok(AddOutcome::Appended)
    } else {
        Ok(AddOutcome::Merged {
            line_id: CartLineId::new(row.id),
            new_quantity: row.quantity,
        })
    }
}

/// Delete the given lines from a customer's cart.
///
/// Lines added after the caller read the cart are left alone.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn remove_lines<'e>(
    executor: impl PgExecutor<'e>,
    user_id: UserId,
    line_ids: &[CartLineId],
) -> Result<u64, RepositoryError> {
    if line_ids.is_empty() {
        return Ok(0);
    }
    let ids: Vec<i32> = line_ids.iter().map(CartLineId::as_i32).collect();

    let result = sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(ids)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
