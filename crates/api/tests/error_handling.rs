//! Tests for `AppError` to HTTP response mapping.
//!
//! These call `IntoResponse` directly and need no router.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use taskflow_api::error::AppError;
use taskflow_core::blob::BlobError;
use taskflow_core::error::CoreError;
use taskflow_db::StoreError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Project",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project with id 42 not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::validation("Title is required"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Title is required");
}

#[tokio::test]
async fn forbidden_error_carries_reason() {
    let (status, json) = error_to_response(AppError::Core(CoreError::forbidden(
        "team members outside department",
    )))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["error"], "team members outside department");
}

#[tokio::test]
async fn referential_integrity_returns_409() {
    let err = AppError::Core(CoreError::ReferentialIntegrity(
        "user is still referenced".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "REFERENTIAL_INTEGRITY");
}

#[tokio::test]
async fn unique_violation_returns_409() {
    let err = AppError::Store(StoreError::UniqueViolation("users.login".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn unauthorized_returns_401() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Unauthorized("Unknown actor".into()))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn oversized_upload_returns_413() {
    let (status, json) = error_to_response(AppError::PayloadTooLarge("too big".into())).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn missing_blob_returns_404() {
    let err = AppError::Blob(BlobError::NotFound("reports/gone.pdf".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn internal_error_hides_details() {
    let err = AppError::InternalError("connection string leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("leaked"));
}
