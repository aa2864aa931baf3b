//! Contact form route handler.
//!
//! Contact requests are not stored; they go straight to the store's
//! Telegram chat.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use uephone_core::Email;

use super::chat::validate_message;
use crate::error::{AppError, Result};
use crate::services::telegram::Notification;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `POST /api/contact`
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<Json<ContactResponse>> {
    let email = Email::parse(&form.email)
        .map_err(|_| AppError::BadRequest("Please enter a valid email address.".to_string()))?;
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }
    let message = validate_message(&form.message)?.to_string();

    state.notifier().notify(Notification::ContactRequest {
        name: name.to_string(),
        email: email.to_string(),
        phone: optional(form.phone),
        subject: optional(form.subject),
        message,
    });

    info!("Contact request forwarded");
    Ok(Json(ContactResponse {
        success: true,
        message: "Thanks! We'll get back to you shortly.".to_string(),
    }))
}
