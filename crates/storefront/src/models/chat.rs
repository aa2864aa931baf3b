//! Support chat messages.

use chrono::{DateTime, Utc};
use serde::Serialize;

use uephone_core::ChatMessageId;

/// `user_id` recorded on admin replies.
pub const ADMIN_USER_ID: &str = "admin";

/// Longest message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    /// Customer id as sent by the client, or [`ADMIN_USER_ID`].
    pub user_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub message: String,
    pub is_admin_reply: bool,
    pub is_read: bool,
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
}

/// One row of the admin inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub latest_message: String,
    pub latest_message_time: DateTime<Utc>,
    /// Unread customer messages.
    pub unread_count: i64,
    pub is_latest_from_admin: bool,
}
