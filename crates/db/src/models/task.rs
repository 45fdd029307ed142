//! Task entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use taskflow_core::error::CoreError;
use taskflow_core::membership::Team;
use taskflow_core::types::{DbId, Timestamp};

use crate::models::member::Member;

/// A task row joined with its project, inherited department and primary
/// curator name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub key: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub project_id: DbId,
    pub project_key: String,
    pub project_name: String,
    pub department_id: DbId,
    pub department_name: String,
    pub curator_user_id: DbId,
    pub curator_name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskWithTeam {
    #[serde(flatten)]
    pub task: Task,
    pub curators: Vec<Member>,
    pub assignees: Vec<Member>,
}

/// Create and update input. Updates replace every field; a blank key keeps
/// the stored one.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub status: String,
    pub priority: String,
    pub project_id: DbId,
    pub curator_ids: Vec<DbId>,
    pub assignee_ids: Vec<DbId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl TaskInput {
    pub fn validate(&self) -> Result<Team, CoreError> {
        let required = [
            ("title", &self.title),
            ("type", &self.task_type),
            ("status", &self.status),
            ("priority", &self.priority),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CoreError::Validation(format!("Task {field} is required")));
        }
        if self.project_id <= 0 {
            return Err(CoreError::validation("Task project is required"));
        }
        Team::new(&self.curator_ids, &self.assignee_ids)
    }
}

/// Authorization facts for an existing task.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct TaskScope {
    pub id: DbId,
    pub project_id: DbId,
    pub department_id: DbId,
}
