//! Core types for UEPhone.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod payment_method;
pub mod price;
pub mod status;
pub mod tracking;

pub use email::{Email, EmailError};
pub use id::*;
pub use payment_method::{PaymentMethod, PaymentMethodGroup};
pub use price::{Currency, Price, UnknownCurrency, round_money};
pub use status::*;
pub use tracking::{TRACKING_PREFIX, parse_tracking_number, tracking_number};
