//! Note HTTP handlers: CRUD, trash lifecycle, flags and ordering.
//!
//! Creating a note, or updating either participant list, dispatches contact
//! extraction in the background after the write has committed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use rapport_core::{CreateNoteRequest, Note, NoteListScope, NoteRepository, UpdateNoteRequest};

use crate::handlers::{
    message, ArchivedResponse, DeletedResponse, MessageResponse, PinnedResponse,
};
use crate::query_types::{parse_clearable, parse_meeting_date, parse_optional};
use crate::services::activity_log::{record_activity, NOTE_CREATED};
use crate::services::dispatch_contact_extraction;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateNoteBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub account_id: String,
    pub template_type: Option<String>,
    #[serde(default)]
    pub internal_participants: Vec<String>,
    #[serde(default)]
    pub external_participants: Vec<String>,
    #[serde(default)]
    pub content: String,
    pub meeting_id: Option<String>,
    pub meeting_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteBody {
    pub title: Option<String>,
    pub account_id: Option<String>,
    pub template_type: Option<String>,
    pub internal_participants: Option<Vec<String>>,
    pub external_participants: Option<Vec<String>>,
    pub content: Option<String>,
    pub meeting_id: Option<String>,
    /// An empty string clears the date.
    pub meeting_date: Option<String>,
    pub pinned: Option<bool>,
    pub archived: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderNotesBody {
    #[serde(default)]
    pub note_ids: Vec<String>,
}

fn meeting_date(value: Option<&str>) -> Result<Option<chrono::DateTime<chrono::Utc>>, ApiError> {
    parse_optional(value, parse_meeting_date).map_err(ApiError::BadRequest)
}

pub(crate) fn extract_contacts(state: &AppState, note: &Note) {
    // Dropping the handle detaches the task.
    let _ = dispatch_contact_extraction(
        state.db.clone(),
        note.id.clone(),
        note.internal_participants.clone(),
        note.external_participants.clone(),
    );
}

pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.db.notes.list(NoteListScope::Active).await?))
}

pub async fn list_archived_notes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.db.notes.list(NoteListScope::Archived).await?))
}

/// The trash view.
pub async fn list_deleted_notes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.db.notes.list(NoteListScope::Trash).await?))
}

pub async fn list_account_notes(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.db.notes.list_by_account(&account_id).await?))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.db.notes.get(&id).await?))
}

/// Create a note.
///
/// # Returns
/// - 201 Created with the note
/// - 400 Bad Request for a missing title or account, an unknown account,
///   or an unparseable `meeting_date`
pub async fn create_note(
    State(state): State<AppState>,
    Json(body): Json<CreateNoteBody>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let meeting_date = meeting_date(body.meeting_date.as_deref())?;

    let note = state
        .db
        .notes
        .create(CreateNoteRequest {
            title: body.title,
            account_id: body.account_id,
            template_type: body.template_type,
            internal_participants: body.internal_participants,
            external_participants: body.external_participants,
            content: body.content,
            meeting_id: body.meeting_id,
            meeting_date,
        })
        .await?;

    extract_contacts(&state, &note);
    record_activity(
        &state.db,
        &note.account_id,
        NOTE_CREATED,
        format!("Note created: {}", note.title),
        "note",
        &note.id,
    )
    .await;

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateNoteBody>,
) -> Result<Json<Note>, ApiError> {
    let req = UpdateNoteRequest {
        meeting_date: parse_clearable(body.meeting_date.as_deref(), parse_meeting_date)
            .map_err(ApiError::BadRequest)?,
        title: body.title,
        account_id: body.account_id,
        template_type: body.template_type,
        internal_participants: body.internal_participants,
        external_participants: body.external_participants,
        content: body.content,
        meeting_id: body.meeting_id,
        pinned: body.pinned,
        archived: body.archived,
        sort_order: body.sort_order,
    };
    let touches_participants = req.touches_participants();

    let note = state.db.notes.update(&id, req).await?;
    if touches_participants {
        extract_contacts(&state, &note);
    }
    Ok(Json(note))
}

/// Move a note to the trash.
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.notes.soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.notes.restore(&id).await?;
    Ok(message("Note restored"))
}

/// Permanently delete a note and its attachment files.
pub async fn purge_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let files = match &state.db.attachments {
        Some(attachments) => attachments.filenames_for_note(&id).await?,
        None => Vec::new(),
    };
    state.db.notes.purge(&id).await?;
    if let Some(attachments) = &state.db.attachments {
        attachments.remove_files(&files).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn empty_trash(
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let files = match &state.db.attachments {
        Some(attachments) => attachments.filenames_for_trashed_notes().await?,
        None => Vec::new(),
    };
    let deleted = state.db.notes.empty_trash().await?;
    if let Some(attachments) = &state.db.attachments {
        attachments.remove_files(&files).await;
    }
    Ok(Json(DeletedResponse { deleted }))
}

pub async fn toggle_note_pin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PinnedResponse>, ApiError> {
    let pinned = state.db.notes.toggle_pin(&id).await?;
    Ok(Json(PinnedResponse { pinned }))
}

pub async fn toggle_note_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchivedResponse>, ApiError> {
    let archived = state.db.notes.toggle_archive(&id).await?;
    Ok(Json(ArchivedResponse { archived }))
}

/// Set `sort_order` of an account's notes to their position in `note_ids`.
pub async fn reorder_notes(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(body): Json<ReorderNotesBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    if body.note_ids.is_empty() {
        return Err(ApiError::BadRequest("note_ids is required".to_string()));
    }
    state.db.notes.reorder(&account_id, &body.note_ids).await?;
    Ok(message("Notes reordered"))
}
