use axum::routing::{get, patch, put};
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /            -> list
/// POST   /            -> create
/// PUT    /{id}        -> update
/// DELETE /{id}        -> delete
/// PATCH  /{id}/close  -> close (cascades to tasks)
/// GET    /{id}/tasks  -> tasks
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route("/{id}", put(projects::update).delete(projects::delete))
        .route("/{id}/close", patch(projects::close))
        .route("/{id}/tasks", get(projects::tasks))
}
