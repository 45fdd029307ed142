//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use taskflow_core::authz::{list_scope, ListScope, Listing, Operation};
use taskflow_core::error::CoreError;
use taskflow_core::status::TargetKind;
use taskflow_core::types::DbId;
use taskflow_db::models::project::{ProjectInput, ProjectWithTeam};
use taskflow_db::models::task::TaskWithTeam;
use taskflow_db::repositories::{ProjectRepo, TaskRepo};

use crate::error::AppResult;
use crate::handlers::{enforce, target_facts, team_facts, ScopeQuery};
use crate::middleware::actor::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClosedProject {
    pub project: ProjectWithTeam,
    /// Tasks moved to Done by the cascade.
    pub closed_tasks: u64,
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    current: CurrentActor,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<DataResponse<Vec<ProjectWithTeam>>>> {
    let scope = list_scope(&current.actor, Listing::Projects, query.department_id)?;
    let projects = ProjectRepo::list(&state.pool, scope).await?;
    Ok(Json(DataResponse::new(projects)))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(input): Json<ProjectInput>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectWithTeam>>)> {
    let team = input.validate()?;
    let facts = team_facts(&state.pool, &team, input.department_id, None).await?;
    enforce(&current.actor, Operation::WriteTeamed(facts))?;

    let project = ProjectRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(project))))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
    Json(input): Json<ProjectInput>,
) -> AppResult<Json<DataResponse<ProjectWithTeam>>> {
    let team = input.validate()?;
    let existing = ProjectRepo::scope(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id,
        })?;
    let facts = team_facts(
        &state.pool,
        &team,
        input.department_id,
        Some(existing.department_id),
    )
    .await?;
    enforce(&current.actor, Operation::WriteTeamed(facts))?;

    let project = ProjectRepo::update(&state.pool, id, &input).await?;
    Ok(Json(DataResponse::new(project)))
}

/// DELETE /api/v1/projects/{id}
///
/// Removes the project, its tasks and every related team row.
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let facts = target_facts(&state.pool, &current.actor, TargetKind::Project, id).await?;
    enforce(&current.actor, Operation::Delete(facts))?;

    ProjectRepo::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/projects/{id}/close
pub async fn close(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ClosedProject>>> {
    let facts = target_facts(&state.pool, &current.actor, TargetKind::Project, id).await?;
    enforce(&current.actor, Operation::Close(facts))?;

    let closed_tasks = ProjectRepo::close(&state.pool, id).await?;
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id,
        })?;
    Ok(Json(DataResponse::new(ClosedProject {
        project,
        closed_tasks,
    })))
}

/// GET /api/v1/projects/{id}/tasks
///
/// Tasks of one project, filtered by the caller's task listing scope.
///
/// Only unrestricted callers get 404 for a missing project; everyone else
/// gets the filtered list, empty for projects they cannot see.
pub async fn tasks(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TaskWithTeam>>>> {
    let scope = list_scope(&current.actor, Listing::Tasks, None)?;
    if scope == ListScope::All && ProjectRepo::scope(&state.pool, id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: "Project",
            id,
        }
        .into());
    }
    let tasks = TaskRepo::list(&state.pool, scope, Some(id)).await?;
    Ok(Json(DataResponse::new(tasks)))
}
