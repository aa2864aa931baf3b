//! CLI subcommand implementations.

pub mod migrate;
pub mod offers;
pub mod stock;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use uephone_storefront::config::ConfigError;
use uephone_storefront::db::{self, RepositoryError};
use uephone_storefront::services::offers::OfferError;

/// Errors shared by every subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Offer error: {0}")]
    Offer(#[from] OfferError),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid stock file: {0}")]
    InvalidStockFile(#[from] serde_json::Error),

    #[error("Invalid stock item at index {index}: {message}")]
    InvalidStockItem { index: usize, message: String },
}

/// Connect using `STOREFRONT_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}
