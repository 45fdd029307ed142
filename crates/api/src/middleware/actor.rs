//! Actor resolution for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use taskflow_core::authz::Actor;
use taskflow_core::error::CoreError;
use taskflow_db::models::user::User;
use taskflow_db::repositories::UserRepo;

use crate::error::AppError;
use crate::state::AppState;

/// Header naming the login on whose behalf the request is made.
pub const ACTOR_HEADER: &str = "x-actor-login";

/// The acting user, looked up fresh on every request so role and department
/// changes apply immediately.
///
/// ```ignore
/// async fn my_handler(current: CurrentActor) -> AppResult<Json<()>> {
///     tracing::info!(user_id = current.actor.id, role = %current.actor.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentActor {
    pub actor: Actor,
    pub user: User,
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let login = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing X-Actor-Login header".into()))
            })?;

        let user = UserRepo::find_by_login(&state.pool, login)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown actor".into())))?;

        let actor = user.actor()?;
        Ok(CurrentActor { actor, user })
    }
}
