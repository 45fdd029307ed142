use axum::routing::{get, patch, put};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /            -> list
/// POST   /            -> create
/// PUT    /{id}        -> update
/// DELETE /{id}        -> delete
/// PATCH  /{id}/close  -> close
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list).post(tasks::create))
        .route("/{id}", put(tasks::update).delete(tasks::delete))
        .route("/{id}/close", patch(tasks::close))
}
