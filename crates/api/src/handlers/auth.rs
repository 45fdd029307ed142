//! Handlers for `/auth` (self-registration and credential check).
//!
//! No tokens are issued; clients name the acting login on later requests.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use taskflow_core::error::CoreError;
use taskflow_core::roles::Role;
use taskflow_core::types::DbId;
use taskflow_db::models::department::validate_department;
use taskflow_db::models::user::{CreateUser, UserResponse};
use taskflow_db::repositories::UserRepo;

use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub repeat_password: String,
    pub full_name: String,
    pub position: String,
    pub department_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// POST /api/v1/auth/register
///
/// Creates a Member in the chosen department. The position must belong to
/// that department.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    if input.password != input.repeat_password {
        return Err(CoreError::validation("Passwords do not match").into());
    }
    validate_password_strength(&input.password).map_err(CoreError::Validation)?;
    validate_department(input.department_id)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            login: input.login,
            password_hash,
            full_name: input.full_name,
            position: input.position,
            role: Role::Member,
            department_id: input.department_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid login or password".into()));

    let user = UserRepo::find_by_login(&state.pool, &input.login)
        .await?
        .ok_or_else(invalid)?;

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        tracing::warn!(login = %user.login, "Failed login attempt");
        return Err(invalid());
    }

    let response = UserRepo::find_response(&state.pool, user.id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user.id,
        })?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(DataResponse::new(response)))
}
