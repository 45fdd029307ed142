use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::chat::{self, MAX_CHAT_ATTACHMENT_BYTES};
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Routes mounted at `/chat`.
///
/// ```text
/// GET  /department           -> department_history
/// POST /department           -> post_department
/// GET  /task/{id}            -> task_history
/// POST /task/{id}            -> post_task (multipart)
/// GET  /messages/{id}/file   -> download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/department",
            get(chat::department_history).post(chat::post_department),
        )
        .route(
            "/task/{id}",
            get(chat::task_history)
                .post(chat::post_task)
                .layer(DefaultBodyLimit::max(
                    MAX_CHAT_ATTACHMENT_BYTES + FORM_OVERHEAD_BYTES,
                )),
        )
        .route("/messages/{id}/file", get(chat::download))
}
