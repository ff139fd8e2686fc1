//! Markdown file import.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use rapport_core::defaults::{IMPORTED_TEMPLATE_TYPE, UNASSIGNED_ACCOUNT};
use rapport_core::{AccountRepository, CreateNoteRequest, NoteRepository};

use crate::handlers::notes::extract_contacts;
use crate::services::activity_log::{record_activity, NOTE_CREATED};
use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct ImportedNote {
    pub id: String,
    pub title: String,
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Split a Markdown document into a note title and HTML body.
///
/// A leading `# ` line becomes the title, otherwise the file name without
/// its `.md` suffix. Only `## ` headings and `- ` bullets are recognised;
/// every other non-blank line becomes a paragraph.
pub fn markdown_to_note(filename: &str, text: &str) -> (String, String) {
    let mut lines = text.lines().peekable();
    let title = match lines.peek().and_then(|l| l.strip_prefix("# ")) {
        Some(heading) => heading.trim().to_string(),
        None => filename
            .strip_suffix(".md")
            .unwrap_or(filename)
            .to_string(),
    };

    let mut html = String::new();
    for line in lines {
        if line.trim().is_empty() || line.starts_with("# ") {
            continue;
        }
        if let Some(heading) = line.strip_prefix("## ") {
            html.push_str(&format!("<h2>{}</h2>", escape_html(heading)));
        } else if let Some(item) = line.strip_prefix("- ") {
            html.push_str(&format!("<ul><li>{}</li></ul>", escape_html(item)));
        } else {
            html.push_str(&format!("<p>{}</p>", escape_html(line)));
        }
    }

    (title, html)
}

/// Import a Markdown file from the multipart field `file` as a new note.
///
/// An optional `account_id` field files the note; without it the note goes
/// to the "Unassigned" account.
///
/// # Returns
/// - 201 Created with `{id, title}`
/// - 400 Bad Request if no `file` field is present or it is not UTF-8
pub async fn import_markdown(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportedNote>), ApiError> {
    let mut account_id = None;
    let mut document = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("import.md").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                let text = String::from_utf8(data.to_vec())
                    .map_err(|_| ApiError::BadRequest("File is not valid UTF-8".to_string()))?;
                document = Some((filename, text));
            }
            Some("account_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid account_id: {}", e)))?;
                account_id = Some(value.trim().to_string()).filter(|id| !id.is_empty());
            }
            _ => {}
        }
    }

    let (filename, text) =
        document.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let (title, content) = markdown_to_note(&filename, &text);

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
            title,
            account_id,
            template_type: Some(IMPORTED_TEMPLATE_TYPE.to_string()),
            content,
            ..Default::default()
        })
        .await?;

    extract_contacts(&state, &note);
    record_activity(
        &state.db,
        &note.account_id,
        NOTE_CREATED,
        format!("Note imported: {}", note.title),
        "note",
        &note.id,
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ImportedNote {
            id: note.id,
            title: note.title,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_becomes_title() {
        let text = "# Quarterly review\n\n## Wins\n- Closed Acme\nGood quarter overall.\n";
        let (title, html) = markdown_to_note("review.md", text);
        assert_eq!(title, "Quarterly review");
        assert_eq!(
            html,
            "<h2>Wins</h2><ul><li>Closed Acme</li></ul><p>Good quarter overall.</p>"
        );
    }

    #[test]
    fn test_filename_is_fallback_title() {
        let (title, html) = markdown_to_note("standup-notes.md", "Nothing to report\n");
        assert_eq!(title, "standup-notes");
        assert_eq!(html, "<p>Nothing to report</p>");

        let (title, _) = markdown_to_note("notes.txt", "");
        assert_eq!(title, "notes.txt");
    }

    #[test]
    fn test_later_h1_lines_are_dropped_and_text_escaped() {
        let (_, html) = markdown_to_note("a.md", "intro\n# Stray heading\n<b>bold</b> & more");
        assert_eq!(html, "<p>intro</p><p>&lt;b&gt;bold&lt;/b&gt; &amp; more</p>");
    }
}
