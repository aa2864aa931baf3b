//! Account route handlers.
//!
//! Registration and login put a [`CurrentUser`] in the session; every other
//! customer route reads it back through `RequireAuth`.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::db::{CustomerRepository, RepositoryError};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Customer, CustomerProfileUpdate, NewCustomer};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: NewCustomer,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

async fn start_session(session: &Session, customer: &Customer) -> Result<()> {
    let user = CurrentUser {
        id: customer.id,
        email: customer.email.clone(),
    };
    set_current_user(session, &user).await.map_err(|e| {
        AppError::Internal(format!("failed to store session: {e}"))
    })?;
    set_sentry_user(&customer.id, Some(customer.email.as_str()));
    Ok(())
}

/// `POST /api/auth/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = AuthService::new(state.pool())
        .register(&request.email, &request.password, &request.profile)
        .await?;

    start_session(&session, &customer).await?;

    info!(user_id = %customer.id, "Customer registered");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Customer>> {
    let customer = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await
        .inspect_err(|e| warn!(error = %e, "Login failed"))?;

    start_session(&session, &customer).await?;

    info!(user_id = %customer.id, "Customer logged in");
    Ok(Json(customer))
}

/// `POST /api/auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Customer>> {
    let customer = AuthService::new(state.pool())
        .get_customer(user.id)
        .await
        .map_err(|e| match e {
            // Account deleted under a live session
            AuthError::UserNotFound => {
                AppError::Unauthorized("Authentication required".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(customer))
}

/// `PUT /api/auth/me`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(update): Json<CustomerProfileUpdate>,
) -> Result<Json<Customer>> {
    let blank = |field: &Option<String>| field.as_deref().is_some_and(|v| v.trim().is_empty());
    if blank(&update.first_name) || blank(&update.last_name) {
        return Err(AppError::BadRequest(
            "First and last name must not be empty".to_string(),
        ));
    }

    let customer = CustomerRepository::new(state.pool())
        .update_profile(user.id, &update)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::Unauthorized("Authentication required".to_string())
            }
            other => other.into(),
        })?;

    info!("Profile updated");
    Ok(Json(customer))
}
