//! HTTP-level tests for `/reports`: multipart filing, atomic close and
//! scoped downloads.

mod common;

use axum::http::{header, StatusCode};
use common::{
    body_bytes, build_test_app, expect_data, expect_error, get, id_of, post_json, post_multipart,
    seed_user, TestApp,
};
use serde_json::json;
use taskflow_core::roles::Role;
use taskflow_core::types::DbId;

struct Fixture {
    project: DbId,
    task: DbId,
}

/// Department 1 project curated by `pm1` with a task assigned to `dev1`.
/// `qa1` sits in the same department but on neither; `outsider` is in
/// department 2.
async fn fixture(app: &TestApp) -> Fixture {
    seed_user(&app.pool, "owner", Role::Owner, 1).await;
    let pm1 = seed_user(&app.pool, "pm1", Role::ProjectManager, 1).await;
    let dev1 = seed_user(&app.pool, "dev1", Role::Member, 1).await;
    seed_user(&app.pool, "qa1", Role::Member, 1).await;
    seed_user(&app.pool, "outsider", Role::Member, 2).await;
    seed_user(&app.pool, "pm2", Role::ProjectManager, 2).await;

    let project = id_of(
        &expect_data(
            post_json(
                app,
                "/api/v1/projects",
                Some("pm1"),
                json!({"name": "Portal", "department_id": 1, "curator_ids": [pm1], "assignee_ids": [dev1]}),
            )
            .await,
            StatusCode::CREATED,
        )
        .await,
    );
    let task = id_of(
        &expect_data(
            post_json(
                app,
                "/api/v1/tasks",
                Some("pm1"),
                json!({
                    "title": "Login page",
                    "type": "Feature",
                    "status": "In Progress",
                    "priority": "High",
                    "project_id": project,
                    "curator_ids": [pm1],
                    "assignee_ids": [dev1],
                }),
            )
            .await,
            StatusCode::CREATED,
        )
        .await,
    );
    Fixture { project, task }
}

async fn task_status(app: &TestApp, task: DbId) -> String {
    let tasks = expect_data(get(app, "/api/v1/tasks", Some("owner")).await, StatusCode::OK).await;
    tasks
        .as_array()
        .unwrap()
        .iter()
        .find(|t| id_of(t) == task)
        .map(|t| t["status"].as_str().unwrap().to_string())
        .expect("task listed")
}

#[tokio::test]
async fn assignee_files_report_and_closes_task() {
    let app = build_test_app().await;
    let f = fixture(&app).await;
    let target_id = f.task.to_string();

    let report = expect_data(
        post_multipart(
            &app,
            "/api/v1/reports",
            "dev1",
            &[
                ("target_type", None, "task".as_bytes()),
                ("target_id", None, target_id.as_bytes()),
                ("title", None, "Login page shipped".as_bytes()),
                ("resolution", None, "Deployed to production".as_bytes()),
                ("close_item", None, "true".as_bytes()),
                ("file", Some("release-notes.txt"), "v1.2.0".as_bytes()),
            ],
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    assert_eq!(report["target_type"], "task");
    assert_eq!(report["result_status"], "fully complete");
    assert_eq!(report["file_name"], "release-notes.txt");
    assert_eq!(report["file_size"], 6);
    assert_eq!(task_status(&app, f.task).await, "Done");

    let response = get(&app, &format!("/api/v1/reports/{}/file", id_of(&report)), Some("dev1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("release-notes.txt"));
    assert_eq!(body_bytes(response).await, "v1.2.0".as_bytes());
}

#[tokio::test]
async fn report_without_close_leaves_task_open() {
    let app = build_test_app().await;
    let f = fixture(&app).await;
    let target_id = f.task.to_string();

    expect_data(
        post_multipart(
            &app,
            "/api/v1/reports",
            "pm1",
            &[
                ("target_type", None, "task".as_bytes()),
                ("target_id", None, target_id.as_bytes()),
                ("result_status", None, "partially complete".as_bytes()),
                ("title", None, "Halfway".as_bytes()),
            ],
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    assert_eq!(task_status(&app, f.task).await, "In Progress");
}

#[tokio::test]
async fn non_participants_cannot_file_reports() {
    let app = build_test_app().await;
    let f = fixture(&app).await;
    let target_id = f.project.to_string();
    let parts: &[common::Part<'_>] = &[
        ("target_type", None, "project".as_bytes()),
        ("target_id", None, target_id.as_bytes()),
        ("title", None, "Not mine".as_bytes()),
        ("close_item", None, "1".as_bytes()),
    ];

    expect_error(post_multipart(&app, "/api/v1/reports", "qa1", parts).await, StatusCode::FORBIDDEN).await;
    expect_error(post_multipart(&app, "/api/v1/reports", "pm2", parts).await, StatusCode::FORBIDDEN).await;

    let projects = expect_data(get(&app, "/api/v1/projects", Some("owner")).await, StatusCode::OK).await;
    assert_eq!(projects[0]["status"], "Active");
}

#[tokio::test]
async fn report_against_missing_target_is_not_found() {
    let app = build_test_app().await;
    fixture(&app).await;

    expect_error(
        post_multipart(
            &app,
            "/api/v1/reports",
            "owner",
            &[
                ("target_type", None, "task".as_bytes()),
                ("target_id", None, "9999".as_bytes()),
                ("title", None, "Ghost".as_bytes()),
            ],
        )
        .await,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn unknown_target_type_is_rejected() {
    let app = build_test_app().await;
    fixture(&app).await;

    expect_error(
        post_multipart(
            &app,
            "/api/v1/reports",
            "owner",
            &[
                ("target_type", None, "department".as_bytes()),
                ("target_id", None, "1".as_bytes()),
                ("title", None, "Nope".as_bytes()),
            ],
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn oversized_attachment_is_rejected() {
    let app = build_test_app().await;
    let f = fixture(&app).await;
    let target_id = f.task.to_string();
    let big = vec![b'x'; 1024 * 1024 + 1];

    let code = expect_error(
        post_multipart(
            &app,
            "/api/v1/reports",
            "dev1",
            &[
                ("target_type", None, "task".as_bytes()),
                ("target_id", None, target_id.as_bytes()),
                ("title", None, "Too big".as_bytes()),
                ("file", Some("dump.bin"), big.as_slice()),
            ],
        )
        .await,
        StatusCode::PAYLOAD_TOO_LARGE,
    )
    .await;
    assert_eq!(code, "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn reports_outside_scope_are_hidden() {
    let app = build_test_app().await;
    let f = fixture(&app).await;
    let target_id = f.task.to_string();
    let report = expect_data(
        post_multipart(
            &app,
            "/api/v1/reports",
            "dev1",
            &[
                ("target_type", None, "task".as_bytes()),
                ("target_id", None, target_id.as_bytes()),
                ("title", None, "Private".as_bytes()),
                ("file", Some("notes.txt"), "secret".as_bytes()),
            ],
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let report_id = id_of(&report);

    let visible = expect_data(get(&app, "/api/v1/reports", Some("qa1")).await, StatusCode::OK).await;
    assert!(visible.as_array().unwrap().is_empty());
    expect_error(
        get(&app, &format!("/api/v1/reports/{report_id}/file"), Some("qa1")).await,
        StatusCode::NOT_FOUND,
    )
    .await;
    expect_error(
        get(&app, &format!("/api/v1/reports/{report_id}/file"), Some("pm2")).await,
        StatusCode::NOT_FOUND,
    )
    .await;

    let pm_view = expect_data(get(&app, "/api/v1/reports", Some("pm1")).await, StatusCode::OK).await;
    assert_eq!(pm_view.as_array().unwrap().len(), 1);
}
