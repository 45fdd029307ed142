//! Report entity model and DTOs. Reports are immutable once written.

use serde::Serialize;
use sqlx::FromRow;
use taskflow_core::error::CoreError;
use taskflow_core::status::{ResultStatus, TargetKind};
use taskflow_core::types::{DbId, Timestamp};

use crate::models::attachment::Attachment;

/// A report row with its target label and author name resolved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub target_type: String,
    pub target_id: DbId,
    /// `KEY title` of the target, empty when the target no longer exists.
    pub target_label: String,
    pub result_status: String,
    pub author_id: DbId,
    pub author_name: String,
    pub title: String,
    pub resolution: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    /// Department of the target; `None` once the target is gone.
    pub department_id: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateReport {
    pub target_kind: TargetKind,
    pub target_id: DbId,
    pub result_status: ResultStatus,
    pub author_id: DbId,
    pub title: String,
    pub resolution: String,
    pub attachment: Option<Attachment>,
    /// Close the target in the same transaction.
    pub close_item: bool,
}

impl CreateReport {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.target_id <= 0 {
            return Err(CoreError::validation("Report target is required"));
        }
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("Report title is required"));
        }
        Ok(())
    }
}
