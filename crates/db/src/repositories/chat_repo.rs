//! Repository for the append-only `chat_messages` table.

use taskflow_core::status::ChatScopeKind;
use taskflow_core::types::DbId;

use crate::error::DbError;
use crate::models::chat::{ChatAttachment, ChatMessage, CreateChatMessage};
use crate::DbPool;

/// Default number of messages returned by [`ChatRepo::list`].
pub const DEFAULT_HISTORY_LIMIT: i64 = 200;

const COLUMNS: &str = "m.id, m.scope_type, m.scope_id, m.author_user_id AS author_id,
     COALESCE(u.full_name, '') AS author_name, m.body, m.file_name, m.file_size, m.created_at";

pub struct ChatRepo;

impl ChatRepo {
    pub async fn create(pool: &DbPool, input: &CreateChatMessage) -> Result<ChatMessage, DbError> {
        input.validate()?;
        let attachment = input.attachment.as_ref();
        let result = sqlx::query(
            "INSERT INTO chat_messages (scope_type, scope_id, author_user_id, body,
                                        file_name, file_path, file_size, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(input.scope.as_str())
        .bind(input.scope_id)
        .bind(input.author_id)
        .bind(input.body.trim())
        .bind(attachment.map(|a| a.name.as_str()))
        .bind(attachment.map(|a| a.path.as_str()))
        .bind(attachment.map(|a| a.size))
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(
            message_id = id,
            scope_type = input.scope.as_str(),
            scope_id = input.scope_id,
            "Chat message posted"
        );
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("ChatMessage", id))
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<ChatMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM chat_messages m
             LEFT JOIN users u ON u.id = m.author_user_id
             WHERE m.id = ?"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The latest `limit` messages of one room, oldest first.
    pub async fn list(
        pool: &DbPool,
        scope: ChatScopeKind,
        scope_id: DbId,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let query = format!(
            "SELECT * FROM (
                SELECT {COLUMNS} FROM chat_messages m
                LEFT JOIN users u ON u.id = m.author_user_id
                WHERE m.scope_type = ? AND m.scope_id = ?
                ORDER BY m.id DESC
                LIMIT ?
             ) ORDER BY id ASC"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(scope.as_str())
            .bind(scope_id)
            .bind(limit.max(1))
            .fetch_all(pool)
            .await
    }

    pub async fn attachment(pool: &DbPool, id: DbId) -> Result<Option<ChatAttachment>, sqlx::Error> {
        sqlx::query_as::<_, ChatAttachment>(
            "SELECT scope_type, scope_id, file_name, file_path FROM chat_messages
             WHERE id = ? AND file_name IS NOT NULL AND file_path IS NOT NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
