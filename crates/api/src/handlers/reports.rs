//! Handlers for the `/reports` resource.
//!
//! Filing a report is the way work gets closed: with `close_item` set, the
//! report insert and the closure commit together.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use taskflow_core::authz::{list_scope, Listing, Operation};
use taskflow_core::error::CoreError;
use taskflow_core::status::{ResultStatus, TargetKind};
use taskflow_core::types::DbId;
use taskflow_db::models::report::{CreateReport, Report};
use taskflow_db::repositories::ReportRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::upload::{attachment_response, discard_file, read_form, store_file};
use crate::handlers::{enforce, target_facts, ScopeQuery};
use crate::middleware::actor::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/reports
pub async fn list(
    State(state): State<AppState>,
    current: CurrentActor,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<DataResponse<Vec<Report>>>> {
    let scope = list_scope(&current.actor, Listing::Reports, query.department_id)?;
    let reports = ReportRepo::list(&state.pool, scope).await?;
    Ok(Json(DataResponse::new(reports)))
}

/// POST /api/v1/reports
///
/// Multipart fields: `target_type`, `target_id`, `result_status`, `title`,
/// `resolution`, `close_item` and an optional `file`.
pub async fn create(
    State(state): State<AppState>,
    current: CurrentActor,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Report>>)> {
    let form = read_form(multipart, state.config.max_upload_bytes).await?;

    let target_kind = TargetKind::parse(form.text("target_type"))?;
    let target_id: DbId = form
        .text("target_id")
        .parse()
        .map_err(|_| CoreError::validation("target_id must be a positive integer"))?;
    let result_status = match form.text("result_status") {
        "" => ResultStatus::default(),
        raw => ResultStatus::parse(raw)?,
    };

    let facts = target_facts(&state.pool, &current.actor, target_kind, target_id).await?;
    enforce(&current.actor, Operation::FileReport(facts))?;

    let mut input = CreateReport {
        target_kind,
        target_id,
        result_status,
        author_id: current.actor.id,
        title: form.text("title").to_string(),
        resolution: form.text("resolution").to_string(),
        attachment: None,
        close_item: form.flag("close_item"),
    };
    input.validate()?;

    if let Some(file) = &form.file {
        input.attachment = Some(store_file(state.blobs.as_ref(), "reports", file).await?);
    }

    match ReportRepo::create(&state.pool, &input).await {
        Ok(report) => Ok((StatusCode::CREATED, Json(DataResponse::new(report)))),
        Err(e) => {
            if let Some(attachment) = &input.attachment {
                discard_file(state.blobs.as_ref(), attachment).await;
            }
            Err(e.into())
        }
    }
}

/// GET /api/v1/reports/{id}/file
///
/// Only reports the caller could list are downloadable.
pub async fn download(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let scope = list_scope(&current.actor, Listing::Reports, None)?;
    let file = ReportRepo::attachment(&state.pool, id, scope)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Report attachment",
                id,
            })
        })?;
    let bytes = state.blobs.read(&file.file_path).await?;
    attachment_response(&file.file_name, bytes)
}
