//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use uephone_core::{OrderId, OrderStatus, UserId};

use crate::db::{OrderRepository, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth, Viewer};
use crate::models::{Order, OrderItem, Payment, ShippingAddress, TrackingView};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// An order with its lines and latest payment.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// `POST /api/orders`
///
/// Checks out the caller's cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: Option<Json<PlaceOrderRequest>>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let Json(request) = body.unwrap_or_default();
    if let Some(address) = &request.shipping_address
        && (address.country.trim().is_empty() || address.street_address.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "Shipping address needs a country and street address".to_string(),
        ));
    }

    let order = CheckoutService::new(state.pool(), state.notifier(), state.config().shipping)
        .place_order(&user, request.shipping_address)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "order_id": order.id, "total": order.total_amount })),
    ))
}

/// `GET /api/orders`
pub async fn list_mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(
        OrderRepository::new(state.pool())
            .list_for_user(user.id)
            .await?,
    ))
}

/// `GET /api/orders/{id}`
///
/// Visible to the order's owner and to admins.
pub async fn show(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(OrderId::new(id))
        .await?
        .filter(|order| viewer.owner().is_none_or(|owner| owner == order.user_id))
        .ok_or_else(order_not_found)?;

    let items = orders.items(order.id).await?;
    let payment = PaymentRepository::new(state.pool())
        .latest_for_order(order.id)
        .await?;

    Ok(Json(OrderDetail {
        order,
        items,
        payment,
    }))
}

/// `GET /api/orders/by-user/{user_id}`
pub async fn by_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(
        OrderRepository::new(state.pool())
            .list_for_user(UserId::new(user_id))
            .await?,
    ))
}

/// `GET /api/orders/by-tracking/{tracking_number}`
///
/// Public tracking lookup. Returns no customer details.
pub async fn by_tracking(
    State(state): State<AppState>,
    Path(tracking_number): Path<String>,
) -> Result<Json<TrackingView>> {
    let tracking_number = tracking_number.trim().to_ascii_uppercase();
    OrderRepository::new(state.pool())
        .get_by_tracking_number(&tracking_number)
        .await?
        .as_ref()
        .and_then(TrackingView::from_order)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Tracking number not found".to_string()))
}

/// `PUT /api/admin/orders/{id}/status`
#[instrument(skip_all, fields(order_id = id, status = %request.status))]
pub async fn update_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let order = CheckoutService::new(state.pool(), state.notifier(), state.config().shipping)
        .update_status(OrderId::new(id), request.status)
        .await?;
    Ok(Json(order))
}
