//! Checkout and payment errors.

use thiserror::Error;

use uephone_core::{OrderStatus, StockItemId};

use crate::db::RepositoryError;

/// Errors from placing orders, recording payments and moving order status.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("minimum order is {required} units, cart has {actual}")]
    BelowMinimum { required: i64, actual: i64 },

    #[error("only {available} units of item {item} available, {requested} requested")]
    InsufficientStock {
        item: StockItemId,
        available: i32,
        requested: i64,
    },

    #[error("order not found")]
    OrderNotFound,

    #[error("payment not found")]
    PaymentNotFound,

    #[error("order is {0}, expected pending")]
    OrderNotPending(OrderStatus),

    #[error("payment is no longer pending")]
    PaymentNotPending,

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}
