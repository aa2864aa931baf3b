//! Cart route handlers.
//!
//! Carts are stored per customer, so every route needs a session. Totals are
//! always computed here from stored lines.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use uephone_core::{
    AddOutcome, CartLine, CartLineId, CartTotals, Currency, FormattedTotals, StockItemId, UserId,
};

use super::parse_currency;
use crate::db::{CartRepository, StockRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::telegram::Notification;
use crate::state::AppState;

/// A cart with server-computed totals.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    #[serde(flatten)]
    pub totals: CartTotals,
    pub formatted: FormattedTotals,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub stock_item_id: StockItemId,
    pub quantity: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    pub quantity: i32,
}

async fn cart_view(state: &AppState, user_id: UserId, currency: Currency) -> Result<CartView> {
    let cart = CartRepository::new(state.pool()).get(user_id).await?;
    let totals = CartTotals::compute(&cart, &state.config().shipping);
    Ok(CartView {
        formatted: totals.formatted(currency),
        totals,
        lines: cart.lines,
    })
}

/// `GET /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<CartView>> {
    let currency = parse_currency(query.currency.as_deref())?;
    Ok(Json(cart_view(&state, user.id, currency).await?))
}

/// `POST /api/cart/items`
///
/// Adds units at list price. The cart may never hold more units of a phone
/// than are in stock.
#[instrument(skip(state, user, request), fields(user_id = %user.id, stock_item_id = %request.stock_item_id))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CurrencyQuery>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let currency = parse_currency(query.currency.as_deref())?;
    if request.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let item = StockRepository::new(state.pool())
        .get(request.stock_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

    let carts = CartRepository::new(state.pool());
    let in_cart = carts.get(user.id).await?.quantity_of(item.id);
    if in_cart + i64::from(request.quantity) > i64::from(item.quantity) {
        return Err(AppError::Conflict(format!(
            "Only {} units available, {in_cart} already in cart",
            item.quantity
        )));
    }

    let mut line = item.cart_line(item.price, request.quantity);
    line.image_url = request.image_url;
    let outcome = carts.add(user.id, line).await?;

    match outcome {
        AddOutcome::Merged { new_quantity, .. } => {
            info!(new_quantity, "Merged into existing cart line");
        }
        AddOutcome::Appended => info!(quantity = request.quantity, "Added cart line"),
    }
    let stock_item_id = item.id.to_string();
    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("stock_item_id", stock_item_id.as_str())]),
    );

    state.notifier().notify(Notification::CartItemAdded {
        customer_email: user.email.to_string(),
        product: item.name,
        quantity: request.quantity,
        unit_price: item.price,
    });

    Ok((
        StatusCode::CREATED,
        Json(cart_view(&state, user.id, currency).await?),
    ))
}

/// `PUT /api/cart/lines/{line_id}`
///
/// A quantity of zero or less removes the line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update_line(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(line_id): Path<i32>,
    Query(query): Query<CurrencyQuery>,
    Json(request): Json<UpdateLineRequest>,
) -> Result<Json<CartView>> {
    let currency = parse_currency(query.currency.as_deref())?;
    let found = CartRepository::new(state.pool())
        .update_quantity(user.id, CartLineId::new(line_id), request.quantity)
        .await?;
    if !found {
        return Err(AppError::NotFound("Cart line not found".to_string()));
    }
    Ok(Json(cart_view(&state, user.id, currency).await?))
}

/// `DELETE /api/cart/lines/{line_id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_line(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(line_id): Path<i32>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<CartView>> {
    let currency = parse_currency(query.currency.as_deref())?;
    let found = CartRepository::new(state.pool())
        .remove(user.id, CartLineId::new(line_id))
        .await?;
    if !found {
        return Err(AppError::NotFound("Cart line not found".to_string()));
    }
    Ok(Json(cart_view(&state, user.id, currency).await?))
}

/// `DELETE /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    let removed = CartRepository::new(state.pool()).clear(user.id).await?;
    info!(removed, "Cart cleared");
    Ok(StatusCode::NO_CONTENT)
}
