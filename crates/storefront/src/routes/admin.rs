//! Admin back-office handlers that do not belong to one resource.

use axum::{Json, extract::State};

use crate::db::{DashboardCounts, DashboardRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /api/admin/dashboard`
pub async fn dashboard(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<DashboardCounts>> {
    Ok(Json(DashboardRepository::new(state.pool()).counts().await?))
}
