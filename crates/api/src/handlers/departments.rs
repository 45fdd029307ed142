use axum::extract::State;
use axum::Json;
use taskflow_core::authz::{list_scope, Listing};
use taskflow_db::models::department::Department;
use taskflow_db::repositories::DepartmentRepo;

use crate::error::AppResult;
use crate::middleware::actor::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/departments
pub async fn list(
    State(state): State<AppState>,
    current: CurrentActor,
) -> AppResult<Json<DataResponse<Vec<Department>>>> {
    let scope = list_scope(&current.actor, Listing::Departments, None)?;
    let departments = DepartmentRepo::list(&state.pool, scope).await?;
    Ok(Json(DataResponse::new(departments)))
}
