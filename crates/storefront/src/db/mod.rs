//! Database operations for the storefront `PostgreSQL` database.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `stock_item` - Phone catalogue
//! - `customer` - Registered wholesale customers
//! - `store_settings` - Bank details (single row)
//! - `offer` - Negotiated price offers
//! - `cart_line` - Persistent per-customer cart
//! - `customer_order`, `order_item` - Placed orders
//! - `payment` - Manually confirmed payments
//! - `chat_message` - Polled support chat
//!
//! Sessions live in the tower-sessions table created by the CLI.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p uephone-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through
//! private `FromRow` row types, so building the crate needs no database.

pub mod cart;
pub mod chat;
pub mod customers;
pub mod dashboard;
pub mod offers;
pub mod orders;
pub mod payments;
pub mod settings;
pub mod stock;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use chat::ChatRepository;
pub use customers::CustomerRepository;
pub use dashboard::{DashboardCounts, DashboardRepository};
pub use offers::OfferRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use settings::SettingsRepository;
pub use stock::StockRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Parse a `TEXT` column into a domain enum.
pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {column} in database: {e}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uephone_core::OrderStatus;

    #[test]
    fn test_parse_column_reports_corruption() {
        assert_eq!(
            parse_column::<OrderStatus>("paid", "order status").ok(),
            Some(OrderStatus::Paid)
        );

        let err = parse_column::<OrderStatus>("lost", "order status").unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
        assert!(err.to_string().contains("lost"));
    }
}
