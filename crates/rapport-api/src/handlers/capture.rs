//! Quick capture: create a bare note or todo from a single text box.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rapport_core::defaults::{QUICK_TEMPLATE_TYPE, UNASSIGNED_ACCOUNT};
use rapport_core::{
    AccountRepository, CreateNoteRequest, CreateTodoRequest, NoteRepository, TodoPriority,
    TodoRepository, TodoStatus,
};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct QuickCaptureBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub description: String,
    pub priority: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuickCaptureResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TodoPriority>,
    pub created_at: DateTime<Utc>,
}

/// Create a note or a todo.
///
/// Notes without an account are filed under the "Unassigned" account,
/// which is created on first use.
///
/// # Returns
/// - 201 Created with `{id, type, title, ...}`
/// - 400 Bad Request for a missing title, an unknown type or priority
pub async fn quick_capture(
    State(state): State<AppState>,
    Json(body): Json<QuickCaptureBody>,
) -> Result<(StatusCode, Json<QuickCaptureResponse>), ApiError> {
    let account_id = body.account_id.filter(|id| !id.trim().is_empty());

    let response = match body.kind.as_str() {
        "note" => {
            let account_id = match account_id {
                Some(id) => id,
                None => {
                    state
                        .db
                        .accounts
                        .get_or_create_by_name(UNASSIGNED_ACCOUNT)
                        .await?
                        .id
                }
            };
            let note = state
                .db
                .notes
                .create(CreateNoteRequest {
                    title: body.title,
                    account_id,
                    template_type: Some(QUICK_TEMPLATE_TYPE.to_string()),
                    content: body.content,
                    ..Default::default()
                })
                .await?;
            QuickCaptureResponse {
                id: note.id,
                kind: "note",
                title: note.title,
                account_id: Some(note.account_id),
                priority: None,
                created_at: note.created_at,
            }
        }
        "todo" => {
            let priority = match body.priority.as_deref().map(str::trim) {
                None | Some("") => TodoPriority::default(),
                Some(value) => value.parse()?,
            };
            let todo = state
                .db
                .todos
                .create(CreateTodoRequest {
                    title: body.title,
                    description: body.description,
                    status: TodoStatus::default(),
                    priority,
                    account_id,
                    ..Default::default()
                })
                .await?;
            QuickCaptureResponse {
                id: todo.id,
                kind: "todo",
                title: todo.title,
                account_id: todo.account_id,
                priority: Some(todo.priority),
                created_at: todo.created_at,
            }
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid type, must be 'note' or 'todo'".to_string(),
            ))
        }
    };

    Ok((StatusCode::CREATED, Json(response)))
}
