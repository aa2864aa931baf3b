//! UEPhone Core - Shared domain library.
//!
//! This crate provides the domain types and rules used by every UEPhone
//! component:
//! - `storefront` - JSON API server for the wholesale storefront
//! - `cli` - Command-line tools for migrations, stock imports and offer sweeps
//!
//! # Architecture
//!
//! The core crate contains only types and pure business rules - no I/O, no
//! database access, no HTTP clients. Everything here can be unit tested
//! without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money and currency, email, statuses, payment methods
//! - [`cart`] - Cart line merging and totals
//! - [`offer`] - Offer validation, savings math and the auto-accept policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod offer;
pub mod types;

pub use cart::{AddOutcome, Cart, CartLine, CartTotals, FormattedTotals, ShippingPolicy};
pub use offer::{AutoAcceptPolicy, OfferDecision, OfferTerms, OfferTermsError};
pub use types::*;
