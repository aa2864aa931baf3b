//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! uephone-cli migrate
//! uephone-cli migrate --dir /srv/uephone/migrations
//! ```
//!
//! Applies the `shop` schema migrations, then creates the tower-sessions
//! table. Both steps are idempotent.

use std::path::Path;

use sqlx::migrate::Migrator;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Default location of the migration files, relative to the workspace root.
pub const DEFAULT_MIGRATIONS_DIR: &str = "crates/storefront/migrations";

/// Run storefront and session-store migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run(dir: &Path) -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!(dir = %dir.display(), "Running storefront migrations...");
    let migrator = Migrator::new(dir).await?;
    migrator.run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool.clone())
        .migrate()
        .await
        .map_err(|e| CommandError::SessionStore(e.to_string()))?;

    tracing::info!("Migrations complete");
    Ok(())
}
