//! Handlers for the caller's own profile and avatars.

use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use taskflow_core::blob::extension_of;
use taskflow_core::error::CoreError;
use taskflow_core::positions::validate_role_department_position;
use taskflow_core::types::DbId;
use taskflow_db::models::user::{UpdateProfile, UserResponse};
use taskflow_db::repositories::UserRepo;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::handlers::upload::{discard_file, inline_response, read_form, store_file};
use crate::middleware::actor::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest accepted avatar: 5 MiB.
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

const AVATAR_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub position: String,
    /// New password; blank or absent keeps the current one.
    #[serde(default)]
    pub password: Option<String>,
}

/// GET /api/v1/profile
pub async fn get(
    State(state): State<AppState>,
    current: CurrentActor,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let id = current.actor.id;
    let user = UserRepo::find_response(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    Ok(Json(DataResponse::new(user)))
}

/// PUT /api/v1/profile
///
/// The new position must still suit the caller's role and department.
pub async fn update(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    if input.full_name.trim().is_empty() {
        return Err(CoreError::validation("Full name is required").into());
    }
    validate_role_department_position(
        current.actor.role,
        current.actor.department_id,
        &input.position,
    )?;

    let password_hash = match input.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password_strength(password).map_err(CoreError::Validation)?;
            Some(
                hash_password(password)
                    .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?,
            )
        }
        None => None,
    };

    let user = UserRepo::update_profile(
        &state.pool,
        current.actor.id,
        &UpdateProfile {
            full_name: input.full_name,
            position: input.position,
            password_hash,
        },
    )
    .await?;
    Ok(Json(DataResponse::new(user)))
}

/// POST /api/v1/profile/avatar
///
/// Multipart body with an image in `file`. The replaced image is removed.
pub async fn upload_avatar(
    State(state): State<AppState>,
    current: CurrentActor,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let form = read_form(multipart, MAX_AVATAR_BYTES).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    let ext = extension_of(&file.name);
    if !AVATAR_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported image format '{}'. Supported: {}",
            file.name,
            AVATAR_EXTENSIONS.join(", ")
        )));
    }

    let stored = store_file(state.blobs.as_ref(), "avatars", &file).await?;
    let previous = match UserRepo::set_avatar(&state.pool, current.actor.id, &stored.path).await {
        Ok(previous) => previous,
        Err(e) => {
            discard_file(state.blobs.as_ref(), &stored).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = previous {
        if let Err(e) = state.blobs.remove(&previous).await {
            tracing::warn!(path = %previous, error = %e, "Failed to remove replaced avatar");
        }
    }

    let id = current.actor.id;
    let user = UserRepo::find_response(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    Ok(Json(DataResponse::new(user)))
}

/// GET /api/v1/profile/avatar/{id}
///
/// Public so that plain `<img>` tags can load it.
pub async fn avatar(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<Response> {
    let path = UserRepo::find_by_id(&state.pool, id)
        .await?
        .and_then(|u| u.avatar_path)
        .ok_or(CoreError::NotFound {
            entity: "Avatar",
            id,
        })?;
    let bytes = state.blobs.read(&path).await?;
    inline_response(&path, bytes)
}
