//! Domain models for the storefront.
//!
//! These are validated domain types, separate from the database row types in
//! [`crate::db`]. Everything here serializes to the JSON shapes returned by
//! the API.

pub mod chat;
pub mod customer;
pub mod offer;
pub mod order;
pub mod payment;
pub mod session;
pub mod settings;
pub mod stock;

pub use chat::{ChatMessage, ConversationSummary};
pub use customer::{Customer, CustomerProfileUpdate, NewCustomer};
pub use offer::Offer;
pub use order::{Order, OrderItem, ShippingAddress, TrackingEvent, TrackingView};
pub use payment::Payment;
pub use session::CurrentUser;
pub use settings::{StoreSettings, StoreSettingsUpdate};
pub use stock::{NewStockItem, StockFacets, StockFilter, StockItem, StockItemUpdate};
