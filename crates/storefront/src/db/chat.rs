//! Support chat repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use uephone_core::ChatMessageId;

use super::RepositoryError;
use crate::models::chat::{ChatMessage, ConversationSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: i32,
    user_id: String,
    username: Option<String>,
    email: Option<String>,
    message: String,
    is_admin_reply: bool,
    is_read: bool,
    conversation_id: String,
    created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: ChatMessageId::new(row.id),
            user_id: row.user_id,
            username: row.username,
            email: row.email,
            message: row.message,
            is_admin_reply: row.is_admin_reply,
            is_read: row.is_read,
            conversation_id: row.conversation_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConversationSummaryRow {
    conversation_id: String,
    username: Option<String>,
    email: Option<String>,
    latest_message: String,
    latest_message_time: DateTime<Utc>,
    unread_count: i64,
    is_latest_from_admin: bool,
}

impl From<ConversationSummaryRow> for ConversationSummary {
    fn from(row: ConversationSummaryRow) -> Self {
        Self {
            conversation_id: row.conversation_id,
            username: row.username,
            email: row.email,
            latest_message: row.latest_message,
            latest_message_time: row.latest_message_time,
            unread_count: row.unread_count,
            is_latest_from_admin: row.is_latest_from_admin,
        }
    }
}

const MESSAGE_COLUMNS: &str =
    "id, user_id, username, email, message, is_admin_reply, is_read, conversation_id, created_at";

/// A message about to be stored.
#[derive(Debug, Clone)]
pub struct NewChatMessage<'a> {
    pub user_id: &'a str,
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub message: &'a str,
    pub conversation_id: &'a str,
    pub is_admin_reply: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for chat messages.
pub struct ChatRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChatRepository<'a> {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, message: &NewChatMessage<'_>) -> Result<ChatMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(&format!(
            r"
            INSERT INTO shop.chat_message (
                user_id, username, email, message, is_admin_reply, conversation_id
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(message.user_id)
        .bind(message.username)
        .bind(message.email)
        .bind(message.message)
        .bind(message.is_admin_reply)
        .bind(message.conversation_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Messages of a conversation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(&format!(
            r"
            SELECT {MESSAGE_COLUMNS}
            FROM shop.chat_message
            WHERE conversation_id = $1
            ORDER BY created_at, id
            "
        ))
        .bind(conversation_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    /// Whether any message exists for `conversation_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn conversation_exists(&self, conversation_id: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shop.chat_message WHERE conversation_id = $1)",
        )
        .bind(conversation_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Mark the other side's messages read.
    ///
    /// An admin viewer reads customer messages; a customer viewer reads admin
    /// replies. Returns how many messages changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_read(
        &self,
        conversation_id: &str,
        viewer_is_admin: bool,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.chat_message
            SET is_read = TRUE
            WHERE conversation_id = $1
              AND is_admin_reply = $2
              AND NOT is_read
            ",
        )
        .bind(conversation_id)
        .bind(!viewer_is_admin)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// One summary per conversation, most recent activity first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConversationSummaryRow>(
            r"
            WITH latest AS (
                SELECT DISTINCT ON (conversation_id)
                       conversation_id, message, created_at, is_admin_reply
                FROM shop.chat_message
                ORDER BY conversation_id, created_at DESC, id DESC
            ),
            customer AS (
                SELECT DISTINCT ON (conversation_id)
                       conversation_id, username, email
                FROM shop.chat_message
                WHERE NOT is_admin_reply
                ORDER BY conversation_id, created_at DESC, id DESC
            ),
            unread AS (
                SELECT conversation_id, COUNT(*) AS unread_count
                FROM shop.chat_message
                WHERE NOT is_admin_reply AND NOT is_read
                GROUP BY conversation_id
            )
            SELECT l.conversation_id,
                   c.username,
                   c.email,
                   l.message AS latest_message,
                   l.created_at AS latest_message_time,
                   COALESCE(u.unread_count, 0) AS unread_count,
                   l.is_admin_reply AS is_latest_from_admin
            FROM latest l
            LEFT JOIN customer c USING (conversation_id)
            LEFT JOIN unread u USING (conversation_id)
            ORDER BY l.created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ConversationSummary::from).collect())
    }
}
