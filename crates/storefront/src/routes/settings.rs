//! Store settings route handlers.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{StoreSettings, StoreSettingsUpdate};
use crate::state::AppState;

/// `GET /api/settings`
///
/// Bank details shown on the payment page.
pub async fn show(State(state): State<AppState>) -> Result<Json<StoreSettings>> {
    Ok(Json(SettingsRepository::new(state.pool()).get().await?))
}

/// `PUT /api/settings`
#[instrument(skip_all)]
pub async fn update(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(update): Json<StoreSettingsUpdate>,
) -> Result<Json<StoreSettings>> {
    let settings = SettingsRepository::new(state.pool()).update(&update).await?;
    info!("Store settings updated");
    Ok(Json(settings))
}
