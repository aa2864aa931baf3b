//! Support chat route handlers.
//!
//! Customers poll their conversation; admins read an inbox of conversation
//! summaries and reply by conversation id.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::db::ChatRepository;
use crate::db::chat::NewChatMessage;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::chat::{ADMIN_USER_ID, MAX_MESSAGE_CHARS};
use crate::models::{ChatMessage, ConversationSummary};
use crate::services::telegram::Notification;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub message: String,
    pub conversation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub conversation_id: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminReplyRequest {
    pub conversation_id: String,
    pub message: String,
}

/// Trim a message and check it is non-empty and within the length limit.
pub(crate) fn validate_message(message: &str) -> Result<&str> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(message)
}

fn validate_conversation_id(conversation_id: &str) -> Result<&str> {
    let conversation_id = conversation_id.trim();
    if conversation_id.is_empty() {
        return Err(AppError::BadRequest(
            "conversation_id is required".to_string(),
        ));
    }
    Ok(conversation_id)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `POST /api/chat/messages`
#[instrument(skip_all, fields(conversation_id = %request.conversation_id))]
pub async fn send(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>)> {
    let message = validate_message(&request.message)?;
    let conversation_id = validate_conversation_id(&request.conversation_id)?;
    let user_id = request.user_id.trim();
    if user_id.is_empty() || user_id == ADMIN_USER_ID {
        return Err(AppError::BadRequest("Invalid user_id".to_string()));
    }

    let stored = ChatRepository::new(state.pool())
        .create(&NewChatMessage {
            user_id,
            username: non_empty(request.username.as_deref()),
            email: non_empty(request.email.as_deref()),
            message,
            conversation_id,
            is_admin_reply: false,
        })
        .await?;

    state.notifier().notify(Notification::ChatMessage {
        conversation_id: stored.conversation_id.clone(),
        username: stored.username.clone(),
        email: stored.email.clone(),
        message: stored.message.clone(),
    });

    Ok((StatusCode::CREATED, Json(stored)))
}

/// `GET /api/chat/messages/{conversation_id}`
pub async fn list(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>> {
    let conversation_id = validate_conversation_id(&conversation_id)?;
    Ok(Json(
        ChatRepository::new(state.pool())
            .list(conversation_id)
            .await?,
    ))
}

/// `POST /api/chat/messages/mark-read`
///
/// An admin viewer marks customer messages read; a customer viewer marks
/// admin replies read.
pub async fn mark_read(
    State(state): State<AppState>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>> {
    let conversation_id = validate_conversation_id(&request.conversation_id)?;
    let updated = ChatRepository::new(state.pool())
        .mark_read(conversation_id, request.is_admin)
        .await?;
    Ok(Json(json!({ "updated": updated })))
}

/// `GET /api/chat/admin/messages`
pub async fn conversations(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>> {
    Ok(Json(
        ChatRepository::new(state.pool()).conversations().await?,
    ))
}

/// `POST /api/chat/admin/reply`
#[instrument(skip_all, fields(conversation_id = %request.conversation_id))]
pub async fn admin_reply(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<AdminReplyRequest>,
) -> Result<(StatusCode, Json<ChatMessage>)> {
    let message = validate_message(&request.message)?;
    let conversation_id = validate_conversation_id(&request.conversation_id)?;

    let chat = ChatRepository::new(state.pool());
    if !chat.conversation_exists(conversation_id).await? {
        return Err(AppError::NotFound("Conversation not found".to_string()));
    }

    let reply = chat
        .create(&NewChatMessage {
            user_id: ADMIN_USER_ID,
            username: Some("Support"),
            email: None,
            message,
            conversation_id,
            is_admin_reply: true,
        })
        .await?;

    info!("Admin replied");
    Ok((StatusCode::CREATED, Json(reply)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_trimmed() {
        assert_eq!(validate_message("  hello \n").unwrap(), "hello");
    }

    #[test]
    fn test_blank_message_rejected() {
        assert!(validate_message("   ").is_err());
    }

    #[test]
    fn test_length_limit_counts_chars() {
        let at_limit = "é".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_message(&at_limit).is_ok());
        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate_message(&over).is_err());
    }

    #[test]
    fn test_conversation_id_required() {
        assert!(validate_conversation_id(" ").is_err());
        assert_eq!(validate_conversation_id(" conv-1 ").unwrap(), "conv-1");
    }
}
