//! Shared fixtures for store integration tests.
//!
//! Each test gets its own in-memory database on a single connection, so a
//! repository that touched the pool while holding a transaction would hang
//! the test rather than pass.

#![allow(dead_code)]

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use taskflow_core::positions::department;
use taskflow_core::roles::Role;
use taskflow_core::types::DbId;
use taskflow_db::models::project::ProjectInput;
use taskflow_db::models::task::TaskInput;
use taskflow_db::models::user::CreateUser;
use taskflow_db::repositories::{ProjectRepo, TaskRepo, UserRepo};
use taskflow_db::{run_migrations, DbPool};

pub async fn test_pool() -> DbPool {
    let pool = bare_pool().await;
    run_migrations(&pool).await.expect("migrations");
    pool
}

/// An empty in-memory database without the schema.
pub async fn bare_pool() -> DbPool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory url")
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory pool")
}

/// A position valid for `role` in `department_id`.
pub fn position_for(role: Role, department_id: DbId) -> String {
    let dept = department(department_id).expect("known department");
    match role {
        Role::ProjectManager => dept.head_position.to_string(),
        Role::Admin => taskflow_core::positions::ADMIN_POSITION.to_string(),
        Role::DeputyAdmin => taskflow_core::positions::DEPUTY_ADMIN_POSITION.to_string(),
        _ => dept.positions[dept.positions.len() - 1].to_string(),
    }
}

pub async fn user(pool: &DbPool, login: &str, role: Role, department_id: DbId) -> DbId {
    let input = CreateUser {
        login: login.to_string(),
        password_hash: "hash".to_string(),
        full_name: format!("{login} full name"),
        position: position_for(role, department_id),
        role,
        department_id,
    };
    UserRepo::create(pool, &input).await.expect("create user").id
}

pub async fn member(pool: &DbPool, login: &str, department_id: DbId) -> DbId {
    user(pool, login, Role::Member, department_id).await
}

pub fn project_input(
    name: &str,
    department_id: DbId,
    curators: &[DbId],
    assignees: &[DbId],
) -> ProjectInput {
    ProjectInput {
        key: String::new(),
        name: name.to_string(),
        department_id,
        curator_ids: curators.to_vec(),
        assignee_ids: assignees.to_vec(),
    }
}

pub async fn project(pool: &DbPool, name: &str, curators: &[DbId], assignees: &[DbId]) -> DbId {
    ProjectRepo::create(pool, &project_input(name, 1, curators, assignees))
        .await
        .expect("create project")
        .project
        .id
}

pub fn task_input(project_id: DbId, title: &str, curators: &[DbId], assignees: &[DbId]) -> TaskInput {
    TaskInput {
        key: String::new(),
        title: title.to_string(),
        description: String::new(),
        task_type: "Feature".to_string(),
        status: "New".to_string(),
        priority: "High".to_string(),
        project_id,
        curator_ids: curators.to_vec(),
        assignee_ids: assignees.to_vec(),
        due_date: None,
    }
}

pub async fn task(
    pool: &DbPool,
    project_id: DbId,
    title: &str,
    curators: &[DbId],
    assignees: &[DbId],
) -> DbId {
    TaskRepo::create(pool, &task_input(project_id, title, curators, assignees))
        .await
        .expect("create task")
        .task
        .id
}

/// Row count of `table`, optionally restricted by a raw WHERE clause.
pub async fn count(pool: &DbPool, table: &str, filter: &str) -> i64 {
    let query = if filter.is_empty() {
        format!("SELECT COUNT(*) FROM {table}")
    } else {
        format!("SELECT COUNT(*) FROM {table} WHERE {filter}")
    };
    sqlx::query_scalar(&query)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("count {table} failed: {e}"))
}

pub async fn task_status(pool: &DbPool, task_id: DbId) -> String {
    sqlx::query_scalar("SELECT status FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_one(pool)
        .await
        .expect("task status")
}
