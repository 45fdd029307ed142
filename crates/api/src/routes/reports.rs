use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Routes mounted at `/reports`.
///
/// ```text
/// GET  /           -> list
/// POST /           -> create (multipart)
/// GET  /{id}/file  -> download
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(reports::list)
                .post(reports::create)
                .layer(DefaultBodyLimit::max(max_upload_bytes + FORM_OVERHEAD_BYTES)),
        )
        .route("/{id}/file", get(reports::download))
}
