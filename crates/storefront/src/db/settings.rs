//! Store settings repository (single row).

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::settings::{StoreSettings, StoreSettingsUpdate};

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    bank_name: String,
    account_number: String,
    account_name: String,
    routing_number: String,
    swift_code: String,
}

impl From<SettingsRow> for StoreSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            bank_name: row.bank_name,
            account_number: row.account_number,
            account_name: row.account_name,
            routing_number: row.routing_number,
            swift_code: row.swift_code,
        }
    }
}

/// Repository for the bank details shown at checkout.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Read the settings, creating the empty row on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self) -> Result<StoreSettings, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r"
            INSERT INTO shop.store_settings (id) VALUES (1)
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING bank_name, account_number, account_name, routing_number, swift_code
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        update: &StoreSettingsUpdate,
    ) -> Result<StoreSettings, RepositoryError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r"
            INSERT INTO shop.store_settings (
                id, bank_name, account_number, account_name, routing_number, swift_code
            )
            VALUES (1, COALESCE($1, ''), COALESCE($2, ''), COALESCE($3, ''),
                    COALESCE($4, ''), COALESCE($5, ''))
            ON CONFLICT (id) DO UPDATE
            SET bank_name = COALESCE($1, shop.store_settings.bank_name),
                account_number = COALESCE($2, shop.store_settings.account_number),
                account_name = COALESCE($3, shop.store_settings.account_name),
                routing_number = COALESCE($4, shop.store_settings.routing_number),
                swift_code = COALESCE($5, shop.store_settings.swift_code),
                updated_at = NOW()
            RETURNING bank_name, account_number, account_name, routing_number, swift_code
            ",
        )
        .bind(update.bank_name.as_deref())
        .bind(update.account_number.as_deref())
        .bind(update.account_name.as_deref())
        .bind(update.routing_number.as_deref())
        .bind(update.swift_code.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
