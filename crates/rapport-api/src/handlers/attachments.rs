//! Note attachment handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use rapport_core::Attachment;
use rapport_db::PgAttachmentRepository;

use crate::{ApiError, AppState};

const FALLBACK_MIME: &str = "application/octet-stream";

fn storage(state: &AppState) -> Result<&PgAttachmentRepository, ApiError> {
    state.db.attachments.as_ref().ok_or_else(|| {
        ApiError::Database(rapport_core::Error::Config(
            "Attachment storage is not configured".to_string(),
        ))
    })
}

/// MIME type sniffed from the bytes, else the client's declaration.
pub fn detect_mime_type(data: &[u8], declared: Option<&str>) -> String {
    infer::get(data)
        .map(|kind| kind.mime_type().to_string())
        .or_else(|| {
            declared
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

pub async fn list_attachments(
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> Result<Json<Vec<Attachment>>, ApiError> {
    Ok(Json(storage(&state)?.list(&note_id).await?))
}

/// Upload one file from the multipart field `file`.
///
/// # Returns
/// - 201 Created with the attachment record
/// - 400 Bad Request if no `file` field is present
/// - 404 Not Found if the note is missing or trashed
pub async fn upload_attachment(
    State(state): State<AppState>,
    Path(note_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Attachment>), ApiError> {
    let attachments = storage(&state)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("file").to_string();
        let declared = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let mime_type = detect_mime_type(&data, declared.as_deref());
        let attachment = attachments
            .store(&note_id, &original_name, &mime_type, &data)
            .await?;
        return Ok((StatusCode::CREATED, Json(attachment)));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// Content-Disposition value for serving a stored file inline.
pub fn inline_disposition(original_name: &str) -> String {
    let name: String = original_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("inline; filename=\"{}\"", name)
}

/// Serve the bytes of one attachment.
///
/// # Returns
/// - 200 OK with the file, typed by its recorded MIME type
/// - 404 Not Found if the record or its file is missing
pub async fn download_attachment(
    State(state): State<AppState>,
    Path((note_id, attachment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (attachment, data) = storage(&state)?.download(&note_id, &attachment_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, attachment.mime_type),
            (header::CONTENT_DISPOSITION, inline_disposition(&attachment.original_name)),
        ],
        data,
    ))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Path((note_id, attachment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    storage(&state)?.delete(&note_id, &attachment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mime_type_sniffs_bytes() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_mime_type(&png, Some("text/plain")), "image/png");
    }

    #[test]
    fn test_inline_disposition_quotes_name() {
        assert_eq!(inline_disposition("deck.pdf"), "inline; filename=\"deck.pdf\"");
        assert_eq!(
            inline_disposition("say \"hi\"\n.txt"),
            "inline; filename=\"say _hi__.txt\""
        );
    }

    #[test]
    fn test_detect_mime_type_falls_back() {
        assert_eq!(detect_mime_type(b"plain words", Some("text/plain")), "text/plain");
        assert_eq!(detect_mime_type(b"plain words", Some(" ")), FALLBACK_MIME);
        assert_eq!(detect_mime_type(b"plain words", None), FALLBACK_MIME);
    }
}
