//! Offer workflow errors.

use thiserror::Error;

use uephone_core::OfferTermsError;

use crate::db::RepositoryError;

/// Errors from submitting or resolving offers.
#[derive(Debug, Error)]
pub enum OfferError {
    /// The offer breaks a pricing or quantity rule.
    #[error("invalid offer: {0}")]
    InvalidTerms(#[from] OfferTermsError),

    /// The stock item being offered on does not exist.
    #[error("stock item not found")]
    ItemNotFound,

    /// No such offer, or it belongs to someone else.
    #[error("offer not found")]
    NotFound,

    /// The offer was already accepted, rejected or expired.
    #[error("offer is no longer pending")]
    NotPending,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OfferError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}
