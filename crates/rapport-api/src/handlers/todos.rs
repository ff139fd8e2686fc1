//! Todo HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use rapport_core::{
    CreateTodoRequest, Todo, TodoPriority, TodoRepository, TodoStatus, UpdateTodoRequest,
};

use crate::handlers::{message, MessageResponse, PinnedResponse};
use crate::query_types::{parse_optional, parse_rfc3339};
use crate::services::activity_log::{record_activity, TODO_COMPLETED};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListTodosQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub account_id: Option<String>,
    pub note_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    /// An empty string clears the account.
    pub account_id: Option<String>,
    pub pinned: Option<bool>,
}

fn status(value: Option<&str>) -> Result<Option<TodoStatus>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(v.parse()?)),
        None => Ok(None),
    }
}

fn priority(value: Option<&str>) -> Result<Option<TodoPriority>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(v.parse()?)),
        None => Ok(None),
    }
}

fn due_date(value: Option<&str>) -> Result<Option<chrono::DateTime<chrono::Utc>>, ApiError> {
    parse_optional(value, |v| parse_rfc3339("due_date", v)).map_err(ApiError::BadRequest)
}

pub async fn list_todos(
    State(state): State<AppState>,
    Query(query): Query<ListTodosQuery>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let status = status(query.status.as_deref())?;
    Ok(Json(state.db.todos.list(status).await?))
}

pub async fn list_deleted_todos(
    State(state): State<AppState>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.db.todos.list_deleted().await?))
}

pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.db.todos.get(&id).await?))
}

/// Create a todo, optionally linked to a note.
///
/// # Returns
/// - 201 Created with the todo
/// - 400 Bad Request for a missing title, unknown status/priority, bad
///   `due_date` or unknown account
/// - 404 Not Found if `note_id` names no active note
pub async fn create_todo(
    State(state): State<AppState>,
    Json(body): Json<CreateTodoBody>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let req = CreateTodoRequest {
        status: status(body.status.as_deref())?.unwrap_or_default(),
        priority: priority(body.priority.as_deref())?.unwrap_or_default(),
        due_date: due_date(body.due_date.as_deref())?,
        title: body.title,
        description: body.description,
        account_id: body.account_id.filter(|id| !id.trim().is_empty()),
        note_id: body.note_id.filter(|id| !id.trim().is_empty()),
    };
    let todo = state.db.todos.create(req).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Partial update. Completing a todo that belongs to an account adds a
/// `todo_completed` entry to the account's activity feed.
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTodoBody>,
) -> Result<Json<Todo>, ApiError> {
    let req = UpdateTodoRequest {
        status: status(body.status.as_deref())?,
        priority: priority(body.priority.as_deref())?,
        due_date: due_date(body.due_date.as_deref())?,
        title: body.title,
        description: body.description,
        account_id: body.account_id,
        pinned: body.pinned,
    };

    let completing = req.status == Some(TodoStatus::Completed);
    let was_completed = if completing {
        state.db.todos.get(&id).await?.status == TodoStatus::Completed
    } else {
        false
    };

    let todo = state.db.todos.update(&id, req).await?;

    if completing && !was_completed {
        if let Some(account_id) = &todo.account_id {
            record_activity(
                &state.db,
                account_id,
                TODO_COMPLETED,
                format!("Todo completed: {}", todo.title),
                "todo",
                &todo.id,
            )
            .await;
        }
    }
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.todos.soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.todos.restore(&id).await?;
    Ok(message("Todo restored"))
}

pub async fn purge_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.todos.purge(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_todo_pin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PinnedResponse>, ApiError> {
    let pinned = state.db.todos.toggle_pin(&id).await?;
    Ok(Json(PinnedResponse { pinned }))
}

pub async fn link_todo_note(
    State(state): State<AppState>,
    Path((id, note_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.todos.link_note(&id, &note_id).await?;
    Ok(message("Todo linked to note"))
}

pub async fn unlink_todo_note(
    State(state): State<AppState>,
    Path((id, note_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.todos.unlink_note(&id, &note_id).await?;
    Ok(message("Todo unlinked from note"))
}
