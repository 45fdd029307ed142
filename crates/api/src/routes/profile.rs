use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::profile::{self, MAX_AVATAR_BYTES};
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Routes mounted at `/profile`.
///
/// ```text
/// GET  /             -> get
/// PUT  /             -> update
/// POST /avatar       -> upload_avatar (multipart)
/// GET  /avatar/{id}  -> avatar (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::get).put(profile::update))
        .route(
            "/avatar",
            post(profile::upload_avatar)
                .layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route("/avatar/{id}", get(profile::avatar))
}
