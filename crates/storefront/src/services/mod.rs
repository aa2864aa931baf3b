//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration and password login
//! - `catalog` - Cached stock facet counts
//! - `checkout` - Orders, manual payments and fulfilment status
//! - `offers` - Price offers, their timers and resolution
//! - `telegram` - Store notifications on a Telegram chat

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod offers;
pub mod telegram;
