//! Tag HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use rapport_core::{Tag, TagRepository};

use crate::handlers::{message, MessageResponse};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTagBody {
    #[serde(default)]
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagBody {
    pub name: Option<String>,
    pub color: Option<String>,
}

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.db.tags.list().await?))
}

/// Create a tag. Duplicate names yield 409.
pub async fn create_tag(
    State(state): State<AppState>,
    Json(body): Json<CreateTagBody>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state
        .db
        .tags
        .create(&body.name, body.color.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTagBody>,
) -> Result<Json<Tag>, ApiError> {
    let tag = state
        .db
        .tags
        .update(&id, body.name.as_deref(), body.color.as_deref())
        .await?;
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.tags.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_note_tags(
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.db.tags.list_for_note(&note_id).await?))
}

pub async fn add_tag_to_note(
    State(state): State<AppState>,
    Path((note_id, tag_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.tags.add_to_note(&note_id, &tag_id).await?;
    Ok(message("Tag added to note"))
}

pub async fn remove_tag_from_note(
    State(state): State<AppState>,
    Path((note_id, tag_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.tags.remove_from_note(&note_id, &tag_id).await?;
    Ok(message("Tag removed from note"))
}
