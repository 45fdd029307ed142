//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use taskflow_core::error::CoreError;
use taskflow_core::membership::Team;
use taskflow_core::types::{DbId, Timestamp};

use crate::models::department::validate_department;
use crate::models::member::Member;

/// A project row joined with its department and primary curator names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub key: String,
    pub name: String,
    pub status: String,
    pub department_id: DbId,
    pub department_name: String,
    pub curator_user_id: DbId,
    pub curator_name: String,
    pub created_at: Timestamp,
}

/// A project with its current curator and assignee sets.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithTeam {
    #[serde(flatten)]
    pub project: Project,
    pub curators: Vec<Member>,
    pub assignees: Vec<Member>,
}

/// Create and update input. Updates replace every field; a blank key keeps
/// the stored one.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInput {
    #[serde(default)]
    pub key: String,
    pub name: String,
    pub department_id: DbId,
    pub curator_ids: Vec<DbId>,
    pub assignee_ids: Vec<DbId>,
}

impl ProjectInput {
    /// Check scalar fields and return the normalised team.
    pub fn validate(&self) -> Result<Team, CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("Project name is required"));
        }
        validate_department(self.department_id)?;
        Team::new(&self.curator_ids, &self.assignee_ids)
    }
}

/// Authorization facts for an existing project.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ProjectScope {
    pub id: DbId,
    pub department_id: DbId,
}
