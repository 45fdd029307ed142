pub mod auth;
pub mod chat;
pub mod health;
pub mod profile;
pub mod projects;
pub mod reports;
pub mod tasks;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::handlers::departments;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register, /auth/login                  public
/// /departments                                 list (scoped)
/// /users, /users/{id}, /users/{id}/role        user management
/// /profile, /profile/avatar[/{id}]             own profile, avatars
/// /projects[/{id}[/close|/tasks]]              projects
/// /tasks[/{id}[/close]]                        tasks
/// /reports[/{id}/file]                         reports
/// /chat/department, /chat/task/{id},
/// /chat/messages/{id}/file                     chat
/// ```
///
/// Every route except the public ones resolves the actor from the
/// `X-Actor-Login` header.
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .route("/departments", get(departments::list))
        .nest("/users", users::router())
        .nest("/profile", profile::router())
        .nest("/projects", projects::router())
        .nest("/tasks", tasks::router())
        .nest("/reports", reports::router(max_upload_bytes))
        .nest("/chat", chat::router())
}
