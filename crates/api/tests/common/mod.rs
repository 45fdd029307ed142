//! Shared fixtures for HTTP-level integration tests.
//!
//! Requests go straight to the router through `tower::ServiceExt::oneshot`,
//! with no TCP listener. Every test app owns a fresh in-memory database and
//! a temporary blob directory.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use taskflow_api::config::ServerConfig;
use taskflow_api::middleware::actor::ACTOR_HEADER;
use taskflow_api::router::build_app_router;
use taskflow_api::state::AppState;
use taskflow_core::blob::LocalBlobStore;
use taskflow_core::positions::{self, department};
use taskflow_core::roles::Role;
use taskflow_core::types::DbId;
use taskflow_db::models::user::CreateUser;
use taskflow_db::repositories::UserRepo;
use taskflow_db::{run_migrations, DbPool};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "taskflow-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    /// Blob root; removed when the app is dropped.
    pub data_dir: TempDir,
}

/// A test `ServerConfig` pointing the blob store at `data_dir`.
pub fn test_config(data_dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        data_dir: data_dir.path().to_path_buf(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        bootstrap_owner: None,
    }
}

pub async fn test_pool() -> DbPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations");
    pool
}

/// Build the full application router, with the production middleware stack.
pub async fn build_test_app() -> TestApp {
    let pool = test_pool().await;
    let data_dir = TempDir::new().expect("temp dir");
    let config = test_config(&data_dir);

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        blobs: Arc::new(LocalBlobStore::new(data_dir.path())),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        data_dir,
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// A position valid for `role` in `department_id`.
pub fn position_for(role: Role, department_id: DbId) -> String {
    let dept = department(department_id).expect("known department");
    match role {
        Role::ProjectManager => dept.head_position.to_string(),
        Role::Admin => positions::ADMIN_POSITION.to_string(),
        Role::DeputyAdmin => positions::DEPUTY_ADMIN_POSITION.to_string(),
        _ => dept.positions[dept.positions.len() - 1].to_string(),
    }
}

/// Insert a user directly through the store. The password hash is a
/// placeholder, so these accounts cannot log in.
pub async fn seed_user(pool: &DbPool, login: &str, role: Role, department_id: DbId) -> DbId {
    let input = CreateUser {
        login: login.to_string(),
        password_hash: "hash".to_string(),
        full_name: format!("{login} full name"),
        position: position_for(role, department_id),
        role,
        department_id,
    };
    UserRepo::create(pool, &input).await.expect("seed user").id
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

fn builder(method: Method, uri: &str, actor: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match actor {
        Some(login) => builder.header(ACTOR_HEADER, login),
        None => builder,
    }
}

pub async fn get(app: &TestApp, uri: &str, actor: Option<&str>) -> Response<Body> {
    let request = builder(Method::GET, uri, actor)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

pub async fn delete(app: &TestApp, uri: &str, actor: &str) -> Response<Body> {
    let request = builder(Method::DELETE, uri, Some(actor))
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

pub async fn patch(app: &TestApp, uri: &str, actor: &str) -> Response<Body> {
    let request = builder(Method::PATCH, uri, Some(actor))
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

pub async fn json_request(
    app: &TestApp,
    method: Method,
    uri: &str,
    actor: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let request = builder(method, uri, actor)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}

pub async fn post_json(
    app: &TestApp,
    uri: &str,
    actor: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::POST, uri, actor, body).await
}

pub async fn put_json(
    app: &TestApp,
    uri: &str,
    actor: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::PUT, uri, Some(actor), body).await
}

/// A multipart part: `(field name, Some(file name) for files, contents)`.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, contents) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(
    app: &TestApp,
    uri: &str,
    actor: &str,
    parts: &[Part<'_>],
) -> Response<Body> {
    let request = builder(Method::POST, uri, Some(actor))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("request");
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("json body")
}

/// Assert the status and return the `data` payload.
pub async fn expect_data(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json["data"].clone()
}

/// Assert the status and return the error `code`.
pub async fn expect_error(response: Response<Body>, status: StatusCode) -> String {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json["code"].as_str().unwrap_or_default().to_string()
}

pub fn id_of(data: &serde_json::Value) -> DbId {
    data["id"].as_i64().expect("id")
}
