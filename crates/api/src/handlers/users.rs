//! Handlers for administrative user management under `/users`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use taskflow_core::authz::{list_scope, Listing, Operation, RoleGrant, UserFacts};
use taskflow_core::error::CoreError;
use taskflow_core::roles::Role;
use taskflow_core::types::DbId;
use taskflow_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use taskflow_db::repositories::UserRepo;
use taskflow_db::DbPool;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::handlers::{enforce, ScopeQuery};
use crate::middleware::actor::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub login: String,
    pub password: String,
    pub full_name: String,
    pub position: String,
    pub role: String,
    pub department_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub login: String,
    pub full_name: String,
    pub position: String,
    pub role: String,
    pub department_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    current: CurrentActor,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let scope = list_scope(&current.actor, Listing::Users, query.department_id)?;
    let users = UserRepo::list(&state.pool, scope).await?;
    Ok(Json(DataResponse::new(users)))
}

/// POST /api/v1/users
pub async fn create(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let role = Role::parse(&input.role)?;
    enforce(
        &current.actor,
        Operation::CreateUser(RoleGrant {
            role,
            department_id: input.department_id,
        }),
    )?;
    validate_password_strength(&input.password).map_err(CoreError::Validation)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            login: input.login,
            password_hash,
            full_name: input.full_name,
            position: input.position,
            role,
            department_id: input.department_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let role = Role::parse(&input.role)?;
    let target = user_facts(&state.pool, id).await?;
    enforce(
        &current.actor,
        Operation::EditUser {
            target,
            grant: RoleGrant {
                role,
                department_id: input.department_id,
            },
        },
    )?;

    let user = UserRepo::update(
        &state.pool,
        id,
        &UpdateUser {
            login: input.login,
            full_name: input.full_name,
            position: input.position,
            role,
            department_id: input.department_id,
        },
    )
    .await?;
    Ok(Json(DataResponse::new(user)))
}

/// PATCH /api/v1/users/{id}/role
pub async fn change_role(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
    Json(input): Json<ChangeRoleRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let role = Role::parse(&input.role)?;
    let target = user_facts(&state.pool, id).await?;
    enforce(&current.actor, Operation::ChangeRole { target, role })?;

    let user = UserRepo::update_role(&state.pool, id, role).await?;
    Ok(Json(DataResponse::new(user)))
}

/// DELETE /api/v1/users/{id}
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let target = user_facts(&state.pool, id).await?;
    enforce(&current.actor, Operation::DeleteUser(target))?;

    UserRepo::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn user_facts(pool: &DbPool, id: DbId) -> AppResult<UserFacts> {
    let user: User = UserRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    Ok(UserFacts {
        department_id: user.department_id,
        role: user.role()?,
    })
}
