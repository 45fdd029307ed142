//! HTTP-level tests for `/users` and `/profile`.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    body_bytes, build_test_app, delete, expect_data, expect_error, get, id_of, json_request,
    post_json, post_multipart, position_for, put_json, seed_user,
};
use serde_json::json;
use taskflow_core::roles::Role;

fn new_user(login: &str, role: &str, department_id: i64, position: &str) -> serde_json::Value {
    json!({
        "login": login,
        "password": "initial-pass",
        "full_name": format!("{login} full name"),
        "position": position,
        "role": role,
        "department_id": department_id,
    })
}

#[tokio::test]
async fn project_manager_creates_member_in_own_department() {
    let app = build_test_app().await;
    seed_user(&app.pool, "pm1", Role::ProjectManager, 1).await;

    let user = expect_data(
        post_json(
            &app,
            "/api/v1/users",
            Some("pm1"),
            new_user("newdev", "member", 1, &position_for(Role::Member, 1)),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(user["role"], "Member");
}

#[tokio::test]
async fn project_manager_cannot_grant_leadership_or_other_department() {
    let app = build_test_app().await;
    seed_user(&app.pool, "pm1", Role::ProjectManager, 1).await;

    expect_error(
        post_json(
            &app,
            "/api/v1/users",
            Some("pm1"),
            new_user("boss", "Project Manager", 1, &position_for(Role::ProjectManager, 1)),
        )
        .await,
        StatusCode::FORBIDDEN,
    )
    .await;
    expect_error(
        post_json(
            &app,
            "/api/v1/users",
            Some("pm1"),
            new_user("away", "Member", 2, &position_for(Role::Member, 2)),
        )
        .await,
        StatusCode::FORBIDDEN,
    )
    .await;
}

#[tokio::test]
async fn members_cannot_list_or_manage_users() {
    let app = build_test_app().await;
    seed_user(&app.pool, "dev1", Role::Member, 1).await;

    expect_error(get(&app, "/api/v1/users", Some("dev1")).await, StatusCode::FORBIDDEN).await;
    expect_error(
        post_json(
            &app,
            "/api/v1/users",
            Some("dev1"),
            new_user("friend", "Member", 1, &position_for(Role::Member, 1)),
        )
        .await,
        StatusCode::FORBIDDEN,
    )
    .await;
}

#[tokio::test]
async fn project_manager_lists_own_department_only() {
    let app = build_test_app().await;
    seed_user(&app.pool, "pm1", Role::ProjectManager, 1).await;
    seed_user(&app.pool, "dev1", Role::Member, 1).await;
    seed_user(&app.pool, "infra", Role::Member, 2).await;

    let users = expect_data(
        get(&app, "/api/v1/users?department_id=2", Some("pm1")).await,
        StatusCode::OK,
    )
    .await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u["department_id"] == 1));
}

#[tokio::test]
async fn role_change_is_validated_against_position() {
    let app = build_test_app().await;
    seed_user(&app.pool, "admin", Role::Admin, 1).await;
    let dev = seed_user(&app.pool, "dev1", Role::Member, 1).await;

    let code = expect_error(
        json_request(
            &app,
            Method::PATCH,
            &format!("/api/v1/users/{dev}/role"),
            Some("admin"),
            json!({"role": "Project Manager"}),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(code, "VALIDATION_ERROR");

    let guest = expect_data(
        json_request(
            &app,
            Method::PATCH,
            &format!("/api/v1/users/{dev}/role"),
            Some("admin"),
            json!({"role": "guest"}),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(guest["role"], "Guest");
}

#[tokio::test]
async fn project_manager_cannot_edit_leadership_accounts() {
    let app = build_test_app().await;
    seed_user(&app.pool, "pm1", Role::ProjectManager, 1).await;
    let other_pm = seed_user(&app.pool, "pm1b", Role::ProjectManager, 1).await;

    expect_error(
        put_json(
            &app,
            &format!("/api/v1/users/{other_pm}"),
            "pm1",
            new_user("pm1b", "Member", 1, &position_for(Role::Member, 1)),
        )
        .await,
        StatusCode::FORBIDDEN,
    )
    .await;
    expect_error(
        delete(&app, &format!("/api/v1/users/{other_pm}"), "pm1").await,
        StatusCode::FORBIDDEN,
    )
    .await;
}

#[tokio::test]
async fn admin_moves_user_to_another_department() {
    let app = build_test_app().await;
    seed_user(&app.pool, "admin", Role::Admin, 1).await;
    let dev = seed_user(&app.pool, "dev1", Role::Member, 1).await;

    let moved = expect_data(
        put_json(
            &app,
            &format!("/api/v1/users/{dev}"),
            "admin",
            new_user("dev1", "Member", 3, &position_for(Role::Member, 3)),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(moved["department_id"], 3);
}

#[tokio::test]
async fn deleting_referenced_user_conflicts() {
    let app = build_test_app().await;
    seed_user(&app.pool, "owner", Role::Owner, 1).await;
    let dev = seed_user(&app.pool, "dev1", Role::Member, 1).await;
    let idle = seed_user(&app.pool, "idle", Role::Member, 1).await;
    post_json(
        &app,
        "/api/v1/projects",
        Some("owner"),
        json!({"name": "Portal", "department_id": 1, "curator_ids": [dev], "assignee_ids": [dev]}),
    )
    .await;

    let code = expect_error(
        delete(&app, &format!("/api/v1/users/{dev}"), "owner").await,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(code, "REFERENTIAL_INTEGRITY");

    let response = delete(&app, &format!("/api/v1/users/{idle}"), "owner").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    expect_error(
        delete(&app, &format!("/api/v1/users/{idle}"), "owner").await,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn profile_update_keeps_position_within_department() {
    let app = build_test_app().await;
    seed_user(&app.pool, "dev1", Role::Member, 2).await;

    let updated = expect_data(
        put_json(
            &app,
            "/api/v1/profile",
            "dev1",
            json!({"full_name": "Renamed", "position": "Сетевой инженер"}),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["full_name"], "Renamed");
    assert_eq!(updated["position"], "Сетевой инженер");

    expect_error(
        put_json(
            &app,
            "/api/v1/profile",
            "dev1",
            json!({"full_name": "Renamed", "position": "Инспектор ООИБ"}),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;

    let me = expect_data(get(&app, "/api/v1/profile", Some("dev1")).await, StatusCode::OK).await;
    assert_eq!(me["position"], "Сетевой инженер");
}

#[tokio::test]
async fn avatar_upload_replaces_and_serves_image() {
    let app = build_test_app().await;
    let id = seed_user(&app.pool, "dev1", Role::Member, 1).await;

    let user = expect_data(
        post_multipart(&app, "/api/v1/profile/avatar", "dev1", &[("file", Some("me.png"), "first".as_bytes())]).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(user["has_avatar"], true);
    assert_eq!(id_of(&user), id);

    expect_data(
        post_multipart(&app, "/api/v1/profile/avatar", "dev1", &[("file", Some("me.jpg"), "second".as_bytes())]).await,
        StatusCode::OK,
    )
    .await;

    let response = get(&app, &format!("/api/v1/profile/avatar/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(body_bytes(response).await, "second".as_bytes());

    let avatars = std::fs::read_dir(app.data_dir.path().join("avatars")).unwrap().count();
    assert_eq!(avatars, 1, "replaced avatar is removed");
}

#[tokio::test]
async fn avatar_rejects_non_images() {
    let app = build_test_app().await;
    seed_user(&app.pool, "dev1", Role::Member, 1).await;

    expect_error(
        post_multipart(&app, "/api/v1/profile/avatar", "dev1", &[("file", Some("script.sh"), "echo".as_bytes())]).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
}
