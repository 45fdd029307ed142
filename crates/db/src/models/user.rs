//! User entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use taskflow_core::authz::Actor;
use taskflow_core::error::CoreError;
use taskflow_core::positions::validate_role_department_position;
use taskflow_core::roles::Role;
use taskflow_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub login: String,
    pub password_hash: String,
    pub full_name: String,
    pub position: String,
    pub role: String,
    pub department_id: DbId,
    pub avatar_path: Option<String>,
    pub created_at: Timestamp,
}

impl User {
    /// The stored role. Rows with an unrecognised role cannot act.
    pub fn role(&self) -> Result<Role, CoreError> {
        Role::parse(&self.role).map_err(|_| {
            CoreError::Forbidden(format!("account has an unrecognised role '{}'", self.role))
        })
    }

    pub fn actor(&self) -> Result<Actor, CoreError> {
        Ok(Actor::new(self.id, self.role()?, self.department_id))
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub login: String,
    pub full_name: String,
    pub position: String,
    pub role: String,
    pub department_id: DbId,
    pub department_name: String,
    pub has_avatar: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a user, either by self-registration or by an
/// administrator.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub login: String,
    pub password_hash: String,
    pub full_name: String,
    pub position: String,
    pub role: Role,
    pub department_id: DbId,
}

impl CreateUser {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_identity(&self.login, &self.full_name)?;
        if self.password_hash.is_empty() {
            return Err(CoreError::validation("Password is required"));
        }
        validate_role_department_position(self.role, self.department_id, &self.position)
    }
}

/// DTO for an administrative edit. Every field is replaced.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub login: String,
    pub full_name: String,
    pub position: String,
    pub role: Role,
    pub department_id: DbId,
}

impl UpdateUser {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_identity(&self.login, &self.full_name)?;
        validate_role_department_position(self.role, self.department_id, &self.position)
    }
}

/// DTO for a user editing their own profile.
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    pub full_name: String,
    pub position: String,
    /// New hash when the password is being changed.
    pub password_hash: Option<String>,
}

fn validate_identity(login: &str, full_name: &str) -> Result<(), CoreError> {
    if login.trim().is_empty() {
        return Err(CoreError::validation("Login is required"));
    }
    if full_name.trim().is_empty() {
        return Err(CoreError::validation("Full name is required"));
    }
    Ok(())
}
