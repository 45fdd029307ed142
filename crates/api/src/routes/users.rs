use axum::routing::{get, patch, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /           -> list
/// POST   /           -> create
/// PUT    /{id}       -> update
/// DELETE /{id}       -> delete
/// PATCH  /{id}/role  -> change_role
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list).post(users::create))
        .route("/{id}", put(users::update).delete(users::delete))
        .route("/{id}/role", patch(users::change_role))
}
