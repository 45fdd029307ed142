//! Handlers for department and task chat rooms under `/chat`.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use taskflow_core::authz::{ChatFacts, Operation};
use taskflow_core::error::CoreError;
use taskflow_core::status::ChatScopeKind;
use taskflow_core::types::DbId;
use taskflow_db::models::chat::{ChatMessage, CreateChatMessage};
use taskflow_db::repositories::chat_repo::DEFAULT_HISTORY_LIMIT;
use taskflow_db::repositories::{ChatRepo, TaskRepo};
use taskflow_db::DbPool;

use crate::error::AppResult;
use crate::handlers::enforce;
use crate::handlers::upload::{attachment_response, discard_file, read_form, store_file};
use crate::middleware::actor::CurrentActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest accepted chat attachment: 25 MiB.
pub const MAX_CHAT_ATTACHMENT_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Room to read; defaults to the caller's own department.
    pub department_id: Option<DbId>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PostDepartmentMessage {
    /// Room to post to; defaults to the caller's own department.
    #[serde(default)]
    pub department_id: Option<DbId>,
    pub body: String,
}

/// GET /api/v1/chat/department
pub async fn department_history(
    State(state): State<AppState>,
    current: CurrentActor,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<ChatMessage>>>> {
    let department_id = query.department_id.unwrap_or(current.actor.department_id);
    enforce(&current.actor, Operation::Chat(ChatFacts::Department(department_id)))?;

    let messages = ChatRepo::list(
        &state.pool,
        ChatScopeKind::Department,
        department_id,
        history_limit(query.limit),
    )
    .await?;
    Ok(Json(DataResponse::new(messages)))
}

/// POST /api/v1/chat/department
pub async fn post_department(
    State(state): State<AppState>,
    current: CurrentActor,
    Json(input): Json<PostDepartmentMessage>,
) -> AppResult<(StatusCode, Json<DataResponse<ChatMessage>>)> {
    let department_id = input.department_id.unwrap_or(current.actor.department_id);
    enforce(&current.actor, Operation::Chat(ChatFacts::Department(department_id)))?;

    let message = ChatRepo::create(
        &state.pool,
        &CreateChatMessage {
            scope: ChatScopeKind::Department,
            scope_id: department_id,
            author_id: current.actor.id,
            body: input.body,
            attachment: None,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(message))))
}

/// GET /api/v1/chat/task/{id}
pub async fn task_history(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(task_id): Path<DbId>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<ChatMessage>>>> {
    let facts = task_chat_facts(&state.pool, task_id).await?;
    enforce(&current.actor, Operation::Chat(facts))?;

    let messages = ChatRepo::list(
        &state.pool,
        ChatScopeKind::Task,
        task_id,
        history_limit(query.limit),
    )
    .await?;
    Ok(Json(DataResponse::new(messages)))
}

/// POST /api/v1/chat/task/{id}
///
/// Multipart fields: `body` and an optional `file`; at least one is required.
pub async fn post_task(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(task_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<ChatMessage>>)> {
    let facts = task_chat_facts(&state.pool, task_id).await?;
    enforce(&current.actor, Operation::Chat(facts))?;

    let form = read_form(multipart, MAX_CHAT_ATTACHMENT_BYTES).await?;
    let mut input = CreateChatMessage {
        scope: ChatScopeKind::Task,
        scope_id: task_id,
        author_id: current.actor.id,
        body: form.text("body").to_string(),
        attachment: None,
    };
    if let Some(file) = &form.file {
        input.attachment = Some(store_file(state.blobs.as_ref(), "messages", file).await?);
    }

    match ChatRepo::create(&state.pool, &input).await {
        Ok(message) => Ok((StatusCode::CREATED, Json(DataResponse::new(message)))),
        Err(e) => {
            if let Some(attachment) = &input.attachment {
                discard_file(state.blobs.as_ref(), attachment).await;
            }
            Err(e.into())
        }
    }
}

/// GET /api/v1/chat/messages/{id}/file
///
/// Readable by anyone allowed into the message's room.
pub async fn download(
    State(state): State<AppState>,
    current: CurrentActor,
    Path(message_id): Path<DbId>,
) -> AppResult<Response> {
    let not_found = || CoreError::NotFound {
        entity: "Message attachment",
        id: message_id,
    };
    let file = ChatRepo::attachment(&state.pool, message_id)
        .await?
        .ok_or_else(not_found)?;

    let facts = match ChatScopeKind::parse(&file.scope_type)? {
        ChatScopeKind::Department => ChatFacts::Department(file.scope_id),
        ChatScopeKind::Task => match TaskRepo::scope(&state.pool, file.scope_id).await? {
            Some(task) => ChatFacts::Task {
                department_id: task.department_id,
            },
            None => return Err(not_found().into()),
        },
    };
    enforce(&current.actor, Operation::Chat(facts))?;

    let bytes = state.blobs.read(&file.file_path).await?;
    attachment_response(&file.file_name, bytes)
}

async fn task_chat_facts(pool: &DbPool, task_id: DbId) -> AppResult<ChatFacts> {
    let task = TaskRepo::scope(pool, task_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Task",
            id: task_id,
        })?;
    Ok(ChatFacts::Task {
        department_id: task.department_id,
    })
}

fn history_limit(requested: Option<i64>) -> i64 {
    requested
        .filter(|n| *n > 0)
        .map_or(DEFAULT_HISTORY_LIMIT, |n| n.min(DEFAULT_HISTORY_LIMIT))
}
