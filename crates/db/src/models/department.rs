//! Department entity model.

use serde::Serialize;
use sqlx::FromRow;
use taskflow_core::error::CoreError;
use taskflow_core::positions::is_known_department;
use taskflow_core::types::DbId;

/// A row from the `departments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: DbId,
    pub name: String,
}

/// Reject department ids outside the fixed catalogue.
pub fn validate_department(department_id: DbId) -> Result<(), CoreError> {
    if is_known_department(department_id) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown department id {department_id}"
        )))
    }
}
