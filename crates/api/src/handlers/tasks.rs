//! Handlers for the `/tasks` resource. A task's department is the department
//! of its project.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use taskflow_core::authz::{list_scope, Listing, Operation};
use taskflow_core::error::CoreError;
use taskflow_core::status::TargetKind;
use taskflow_core::types::DbId;
use taskflow_db::models::task::{TaskInput, TaskWithTeam};
use taskflow_db::repositories::{ProjectRepo, TaskRepo};
use taskflow_db::DbPool;

use crate::error::AppResult;
use crate::handlers::{enforce, target_facts, team_facts};
use crate::middleware::actor::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub department_id: Option<DbId>,
    pub project_id: Option<DbId>,
}

/// GET /api/v1/tasks
pub async fn list(
    State(state): State<AppState>,
    current: CurrentActor,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Json<DataResponse<Vec<TaskWithTeam>>>> {
    let scope = list_scope(&current.actor, Listing::Tasks, query.department_id)?;
    let tasks = TaskRepo::list(&state.pool, scope, query.project_id).await?;
    Ok(Json(DataResponse::new(tasks)))
}

/// POST /api/v1/tasks
pub async fn create(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(input): Json<TaskInput>,
) -> AppResult<(StatusCode, Json<DataResponse<TaskWithTeam>>)> {
    let team = input.validate()?;
    let department_id = project_department(&state.pool, input.project_id).await?;
    let facts = team_facts(&state.pool, &team, department_id, None).await?;
    enforce(&current.actor, Operation::WriteTeamed(facts))?;

    let task = TaskRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(task))))
}

/// PUT /api/v1/tasks/{id}
///
/// Moving a task to another project re-checks the team against that
/// project's department.
pub async fn update(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
    Json(input): Json<TaskInput>,
) -> AppResult<Json<DataResponse<TaskWithTeam>>> {
    let team = input.validate()?;
    let existing = TaskRepo::scope(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Task", id })?;
    let department_id = project_department(&state.pool, input.project_id).await?;
    let facts = team_facts(
        &state.pool,
        &team,
        department_id,
        Some(existing.department_id),
    )
    .await?;
    enforce(&current.actor, Operation::WriteTeamed(facts))?;

    let task = TaskRepo::update(&state.pool, id, &input).await?;
    Ok(Json(DataResponse::new(task)))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let facts = target_facts(&state.pool, &current.actor, TargetKind::Task, id).await?;
    enforce(&current.actor, Operation::Delete(facts))?;

    TaskRepo::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/tasks/{id}/close
pub async fn close(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TaskWithTeam>>> {
    let facts = target_facts(&state.pool, &current.actor, TargetKind::Task, id).await?;
    enforce(&current.actor, Operation::Close(facts))?;

    TaskRepo::close(&state.pool, id).await?;
    let task = TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Task", id })?;
    Ok(Json(DataResponse::new(task)))
}

async fn project_department(pool: &DbPool, project_id: DbId) -> AppResult<DbId> {
    let project = ProjectRepo::scope(pool, project_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        })?;
    Ok(project.department_id)
}
