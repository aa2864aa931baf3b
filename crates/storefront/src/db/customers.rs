//! Customer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use uephone_core::{Email, UserId};

use super::{RepositoryError, parse_column};
use crate::models::customer::{Customer, CustomerProfileUpdate, NewCustomer};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    business_name: String,
    phone_number: String,
    whatsapp_number: Option<String>,
    country: String,
    sales_rep: String,
    customs_clearance: String,
    buying_interest: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            business_name: row.business_name,
            phone_number: row.phone_number,
            whatsapp_number: row.whatsapp_number,
            country: row.country,
            sales_rep: parse_column(&row.sales_rep, "sales rep")?,
            customs_clearance: parse_column(&row.customs_clearance, "customs clearance")?,
            buying_interest: row.buying_interest,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    customer: CustomerRow,
    password_hash: String,
}

const CUSTOMER_COLUMNS: &str = "id, email, first_name, last_name, business_name, phone_number, \
     whatsapp_number, country, sales_rep, customs_clearance, buying_interest, created_at";

/// Repository for customer accounts.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get(&self, id: UserId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.customer WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// Get a customer and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS}, password_hash FROM shop.customer WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.customer.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Create a customer with a pre-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        profile: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO shop.customer (
                email, password_hash, first_name, last_name, business_name, phone_number,
                whatsapp_number, country, sales_rep, customs_clearance, buying_interest
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(password_hash)
        .bind(profile.first_name.trim())
        .bind(profile.last_name.trim())
        .bind(profile.business_name.trim())
        .bind(profile.phone_number.trim())
        .bind(profile.whatsapp_number.as_deref().map(str::trim))
        .bind(profile.country.trim())
        .bind(profile.sales_rep.as_str())
        .bind(profile.customs_clearance.as_str())
        .bind(profile.buying_interest.trim())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "email already exists"))?;

        row.try_into()
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &CustomerProfileUpdate,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            UPDATE shop.customer
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                business_name = COALESCE($4, business_name),
                phone_number = COALESCE($5, phone_number),
                whatsapp_number = COALESCE($6, whatsapp_number),
                country = COALESCE($7, country),
                sales_rep = COALESCE($8, sales_rep),
                customs_clearance = COALESCE($9, customs_clearance),
                buying_interest = COALESCE($10, buying_interest),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.first_name.as_deref().map(str::trim))
        .bind(update.last_name.as_deref().map(str::trim))
        .bind(update.business_name.as_deref().map(str::trim))
        .bind(update.phone_number.as_deref().map(str::trim))
        .bind(update.whatsapp_number.as_deref().map(str::trim))
        .bind(update.country.as_deref().map(str::trim))
        .bind(update.sales_rep.map(|r| r.as_str()))
        .bind(update.customs_clearance.map(|c| c.as_str()))
        .bind(update.buying_interest.as_deref().map(str::trim))
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}
