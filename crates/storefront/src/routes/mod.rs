//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (database)
//!
//! # Catalogue
//! GET  /api/stock                           - List with filters
//! GET  /api/stock/facets                    - Grade and location counts
//! GET  /api/stock/{id}                      - One item
//! POST /api/stock                           - Create (admin)
//! PUT  /api/stock/{id}                      - Partial update (admin)
//! DEL  /api/stock/{id}                      - Delete (admin)
//! POST /api/import-stock                    - Replace catalogue (admin)
//!
//! # Cart (session)
//! GET  /api/cart                            - Cart with totals
//! POST /api/cart/items                      - Add at list price
//! PUT  /api/cart/lines/{id}                 - Set quantity
//! DEL  /api/cart/lines/{id}                 - Remove line
//! DEL  /api/cart                            - Clear
//!
//! # Offers
//! POST /api/offers                          - Submit (session)
//! GET  /api/offers                          - Caller's offers
//! GET  /api/offers/{id}                     - One of the caller's offers
//! POST /api/offers/{id}/cancel              - Withdraw
//! GET  /api/admin/offers                    - All offers (admin)
//! POST /api/admin/offers/{id}/accept|reject - Decide (admin)
//!
//! # Orders and payments
//! POST /api/orders                          - Checkout (session)
//! GET  /api/orders                          - Caller's orders
//! GET  /api/orders/{id}                     - Detail (owner or admin)
//! GET  /api/orders/by-user/{user_id}        - (admin)
//! GET  /api/orders/by-tracking/{number}     - Public tracking
//! PUT  /api/admin/orders/{id}/status        - Fulfilment (admin)
//! GET  /api/payments/methods                - Catalogue
//! POST /api/payments                        - Record payment (session)
//! POST /api/payments/{id}/confirm           - Confirm (owner or admin)
//!
//! # Chat and contact
//! POST /api/chat/messages                   - Send
//! GET  /api/chat/messages/{conversation_id} - Poll
//! POST /api/chat/messages/mark-read         - Mark read
//! GET  /api/chat/admin/messages             - Inbox (admin)
//! POST /api/chat/admin/reply                - Reply (admin)
//! POST /api/contact                         - Contact form
//!
//! # Accounts and settings
//! POST /api/auth/register|login|logout
//! GET  /api/auth/me, PUT /api/auth/me
//! GET  /api/settings, PUT /api/settings (admin)
//! GET  /api/admin/dashboard                 - Counts (admin)
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod chat;
pub mod contact;
pub mod health;
pub mod offers;
pub mod orders;
pub mod payments;
pub mod settings;
pub mod stock;

use axum::{
    Router,
    routing::{get, post, put},
};

use uephone_core::Currency;

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Parse a `currency` query value, defaulting to USD.
pub(crate) fn parse_currency(code: Option<&str>) -> Result<Currency, AppError> {
    code.map_or(Ok(Currency::USD), |code| {
        code.parse()
            .map_err(|_| AppError::BadRequest(format!("Unsupported currency: {code}")))
    })
}

/// Create the catalogue routes router.
pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stock::list).post(stock::create))
        .route("/facets", get(stock::facets))
        .route(
            "/{id}",
            get(stock::show).put(stock::update).delete(stock::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/lines/{line_id}",
            put(cart::update_line).delete(cart::remove_line),
        )
}

/// Create the customer offer routes router.
pub fn offer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(offers::list_mine).post(offers::create))
        .route("/{id}", get(offers::show))
        .route("/{id}/cancel", post(offers::cancel))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_mine).post(orders::place))
        .route("/{id}", get(orders::show))
        .route("/by-user/{user_id}", get(orders::by_user))
        .route("/by-tracking/{tracking_number}", get(orders::by_tracking))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(payments::create))
        .route("/methods", get(payments::methods))
        .route("/{id}/confirm", post(payments::confirm))
}

/// Create the chat routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/messages",
            post(chat::send).layer(api_rate_limiter()),
        )
        .route("/messages/mark-read", post(chat::mark_read))
        .route("/messages/{conversation_id}", get(chat::list))
        .route("/admin/messages", get(chat::conversations))
        .route("/admin/reply", post(chat::admin_reply))
}

/// Create the auth routes router. Login and registration are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route_layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).put(auth::update_me))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/offers", get(offers::admin_list))
        .route("/offers/{id}/accept", post(offers::admin_accept))
        .route("/offers/{id}/reject", post(offers::admin_reject))
        .route("/orders/{id}/status", put(orders::update_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/stock", stock_routes())
        .route("/api/import-stock", post(stock::import))
        .nest("/api/cart", cart_routes())
        .nest("/api/offers", offer_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/payments", payment_routes())
        .nest("/api/chat", chat_routes())
        .route(
            "/api/contact",
            post(contact::submit).layer(auth_rate_limiter()),
        )
        .nest("/api/auth", auth_routes())
        .route(
            "/api/settings",
            get(settings::show).put(settings::update),
        )
        .nest("/api/admin", admin_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency(None).unwrap(), Currency::USD);
        assert_eq!(parse_currency(Some("eur")).unwrap(), Currency::EUR);
        assert!(parse_currency(Some("GBP")).is_err());
    }
}
