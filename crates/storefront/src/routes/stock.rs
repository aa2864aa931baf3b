//! Catalogue route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use uephone_core::StockItemId;

use super::parse_currency;
use crate::db::{RepositoryError, StockRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::stock::StockValidationError;
use crate::models::{NewStockItem, StockFacets, StockFilter, StockItem, StockItemUpdate};
use crate::state::AppState;

/// A listed item, with its price rendered in the requested currency.
#[derive(Debug, Serialize)]
pub struct StockItemView {
    #[serde(flatten)]
    pub item: StockItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_price: Option<String>,
}

impl From<StockValidationError> for AppError {
    fn from(err: StockValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

fn item_not_found() -> AppError {
    AppError::NotFound("Item not found".to_string())
}

/// `GET /api/stock`
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<StockFilter>,
) -> Result<Json<Vec<StockItemView>>> {
    let currency = filter
        .currency
        .as_deref()
        .map(|code| parse_currency(Some(code)))
        .transpose()?;

    let items = StockRepository::new(state.pool()).list(&filter).await?;

    Ok(Json(
        items
            .into_iter()
            .map(|item| StockItemView {
                display_price: currency.map(|c| c.format(item.price)),
                item,
            })
            .collect(),
    ))
}

/// `GET /api/stock/facets`
pub async fn facets(State(state): State<AppState>) -> Result<Json<StockFacets>> {
    Ok(Json(state.catalog().facets(state.pool()).await?))
}

/// `GET /api/stock/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StockItem>> {
    StockRepository::new(state.pool())
        .get(StockItemId::new(id))
        .await?
        .map(Json)
        .ok_or_else(item_not_found)
}

/// `POST /api/stock`
#[instrument(skip_all, fields(name = %item.name))]
pub async fn create(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(mut item): Json<NewStockItem>,
) -> Result<impl IntoResponse> {
    item.validate()?;
    // Ids are assigned by the database outside of imports
    item.id = None;

    let created = StockRepository::new(state.pool()).create(&item).await?;
    state.catalog().invalidate().await;

    info!(stock_item_id = %created.id, "Stock item created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/stock/{id}`
#[instrument(skip_all, fields(stock_item_id = id))]
pub async fn update(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(update): Json<StockItemUpdate>,
) -> Result<Json<StockItem>> {
    update.validate()?;

    let updated = StockRepository::new(state.pool())
        .update(StockItemId::new(id), &update)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => item_not_found(),
            other => other.into(),
        })?;
    state.catalog().invalidate().await;

    Ok(Json(updated))
}

/// `DELETE /api/stock/{id}`
#[instrument(skip_all, fields(stock_item_id = id))]
pub async fn delete(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    if !StockRepository::new(state.pool())
        .delete(StockItemId::new(id))
        .await?
    {
        return Err(item_not_found());
    }
    state.catalog().invalidate().await;

    info!("Stock item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/import-stock`
///
/// Replaces the whole catalogue with the posted items.
#[instrument(skip_all, fields(count = items.len()))]
pub async fn import(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(items): Json<Vec<NewStockItem>>,
) -> Result<Json<serde_json::Value>> {
    for (index, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|e| AppError::BadRequest(format!("Item {index}: {e}")))?;
    }

    let report = StockRepository::new(state.pool()).replace_all(&items).await?;
    state.catalog().invalidate().await;

    info!(written = report.written, retired = report.retired, "Stock imported");
    Ok(Json(json!({
        "message": "Stock items imported successfully",
        "count": report.written,
        "retired": report.retired,
    })))
}
