//! Team member summaries attached to projects and tasks.

use serde::Serialize;
use sqlx::FromRow;
use taskflow_core::types::DbId;

/// A curator or assignee as shown next to a project or task.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Member {
    pub id: DbId,
    pub full_name: String,
    pub position: String,
    pub department_id: DbId,
}

/// Junction row joined with its user; grouped by `parent_id` after fetch.
#[derive(Debug, Clone, FromRow)]
pub struct TeamRow {
    pub parent_id: DbId,
    pub id: DbId,
    pub full_name: String,
    pub position: String,
    pub department_id: DbId,
}

impl From<TeamRow> for Member {
    fn from(row: TeamRow) -> Self {
        Member {
            id: row.id,
            full_name: row.full_name,
            position: row.position,
            department_id: row.department_id,
        }
    }
}
