//! File reference persisted next to reports and chat messages.

use serde::Serialize;

/// A blob saved by the blob store; only name, path and size are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub name: String,
    #[serde(skip_serializing)]
    pub path: String,
    pub size: i64,
}

/// Download information for an attachment row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttachmentFile {
    pub file_name: String,
    pub file_path: String,
}
