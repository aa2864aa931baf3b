//! Offer route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use uephone_core::{OfferId, OfferStatus, StockItemId};

use crate::db::OfferRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Offer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub stock_item_id: StockItemId,
    pub quantity: i32,
    /// Offered unit price in USD.
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct OfferListQuery {
    pub status: Option<OfferStatus>,
}

fn offer_not_found() -> AppError {
    AppError::NotFound("Offer not found".to_string())
}

/// `POST /api/offers`
#[instrument(skip_all, fields(user_id = %user.id, stock_item_id = %request.stock_item_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<Offer>)> {
    let offer = state
        .offers()
        .submit(&user, request.stock_item_id, request.quantity, request.price)
        .await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

/// `GET /api/offers`
pub async fn list_mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Offer>>> {
    Ok(Json(
        OfferRepository::new(state.pool())
            .list_for_user(user.id)
            .await?,
    ))
}

/// `GET /api/offers/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Offer>> {
    OfferRepository::new(state.pool())
        .get_owned(OfferId::new(id), user.id)
        .await?
        .map(Json)
        .ok_or_else(offer_not_found)
}

/// `POST /api/offers/{id}/cancel`
#[instrument(skip_all, fields(user_id = %user.id, offer_id = id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Offer>> {
    Ok(Json(
        state.offers().cancel(user.id, OfferId::new(id)).await?,
    ))
}

/// `GET /api/admin/offers`
pub async fn admin_list(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OfferListQuery>,
) -> Result<Json<Vec<Offer>>> {
    Ok(Json(
        OfferRepository::new(state.pool()).list(query.status).await?,
    ))
}

/// `POST /api/admin/offers/{id}/accept`
#[instrument(skip_all, fields(offer_id = id))]
pub async fn admin_accept(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Offer>> {
    Ok(Json(
        state.offers().admin_decide(OfferId::new(id), true).await?,
    ))
}

/// `POST /api/admin/offers/{id}/reject`
#[instrument(skip_all, fields(offer_id = id))]
pub async fn admin_reject(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Offer>> {
    Ok(Json(
        state.offers().admin_decide(OfferId::new(id), false).await?,
    ))
}
