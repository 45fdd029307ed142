//! Chat message model. Messages are append-only.

use serde::Serialize;
use sqlx::FromRow;
use taskflow_core::error::CoreError;
use taskflow_core::status::ChatScopeKind;
use taskflow_core::types::{DbId, Timestamp};

use crate::models::attachment::Attachment;

/// Longest accepted message body, in characters.
pub const MAX_BODY_CHARS: usize = 4000;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMessage {
    pub id: DbId,
    pub scope_type: String,
    pub scope_id: DbId,
    pub author_id: DbId,
    pub author_name: String,
    pub body: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateChatMessage {
    pub scope: ChatScopeKind,
    pub scope_id: DbId,
    pub author_id: DbId,
    pub body: String,
    pub attachment: Option<Attachment>,
}

impl CreateChatMessage {
    /// A message needs text, a file, or both.
    pub fn validate(&self) -> Result<(), CoreError> {
        let body = self.body.trim();
        if body.is_empty() && self.attachment.is_none() {
            return Err(CoreError::validation("Message text or a file is required"));
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(CoreError::Validation(format!(
                "Message is longer than {MAX_BODY_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// Scope of an existing message, used to authorize attachment downloads.
#[derive(Debug, Clone, FromRow)]
pub struct ChatAttachment {
    pub scope_type: String,
    pub scope_id: DbId,
    pub file_name: String,
    pub file_path: String,
}
