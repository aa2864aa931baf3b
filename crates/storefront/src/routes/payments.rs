//! Payment route handlers.
//!
//! Payments are manual: the customer records how they paid, then the
//! customer or an admin confirms it once the money arrives.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use uephone_core::{OrderId, PaymentId, PaymentMethod, PaymentMethodGroup};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, Viewer};
use crate::models::Payment;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// One entry of the payment method catalogue.
#[derive(Debug, Serialize)]
pub struct PaymentMethodView {
    pub id: PaymentMethod,
    pub name: &'static str,
    pub group: PaymentMethodGroup,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// `GET /api/payments/methods`
pub async fn methods() -> Json<Vec<PaymentMethodView>> {
    Json(
        PaymentMethod::ALL
            .into_iter()
            .map(|method| PaymentMethodView {
                id: method,
                name: method.display_name(),
                group: method.group(),
            })
            .collect(),
    )
}

/// `POST /api/payments`
#[instrument(skip_all, fields(user_id = %user.id, order_id = %request.order_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    let transaction_id = request
        .transaction_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    if transaction_id.is_some_and(|id| id.len() > 200) {
        return Err(AppError::BadRequest(
            "transaction_id is too long".to_string(),
        ));
    }

    let payment = CheckoutService::new(state.pool(), state.notifier(), state.config().shipping)
        .create_payment(user.id, request.order_id, request.payment_method, transaction_id)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// `POST /api/payments/{id}/confirm`
#[instrument(skip_all, fields(payment_id = id))]
pub async fn confirm(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>> {
    let (_, order) = CheckoutService::new(state.pool(), state.notifier(), state.config().shipping)
        .confirm_payment(PaymentId::new(id), viewer.owner())
        .await?;

    Ok(Json(json!({
        "message": "Payment confirmed",
        "tracking_number": order.tracking_number,
    })))
}
