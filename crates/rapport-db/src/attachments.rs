//! Attachment records and their backing files.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{info, warn};

use rapport_core::{new_id, Attachment, Error, Result};

use crate::file_storage::{stored_filename, StorageBackend};

const ATTACHMENT_COLUMNS: &str =
    "id, note_id, filename, original_name, mime_type, size, created_at";

fn attachment_from_row(row: &PgRow) -> Attachment {
    Attachment {
        id: row.get("id"),
        note_id: row.get("note_id"),
        filename: row.get("filename"),
        original_name: row.get("original_name"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        created_at: row.get("created_at"),
    }
}

pub(crate) async fn list_for_note(pool: &Pool<Postgres>, note_id: &str) -> Result<Vec<Attachment>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM attachments WHERE note_id = $1 ORDER BY created_at",
        ATTACHMENT_COLUMNS
    ))
    .bind(note_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)?;
    Ok(rows.iter().map(attachment_from_row).collect())
}

/// Attachment metadata in PostgreSQL, bytes in a [`StorageBackend`].
pub struct PgAttachmentRepository {
    pool: Pool<Postgres>,
    backend: Arc<dyn StorageBackend>,
}

impl PgAttachmentRepository {
    pub fn new(pool: Pool<Postgres>, backend: Arc<dyn StorageBackend>) -> Self {
        Self { pool, backend }
    }

    pub async fn list(&self, note_id: &str) -> Result<Vec<Attachment>> {
        list_for_note(&self.pool, note_id).await
    }

    pub async fn get(&self, id: &str) -> Result<Attachment> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM attachments WHERE id = $1",
            ATTACHMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound("Attachment not found".to_string()))?;
        Ok(attachment_from_row(&row))
    }

    /// Fetch one attachment of a note together with its bytes.
    ///
    /// A record whose file has gone missing from storage is `NotFound`.
    pub async fn download(&self, note_id: &str, attachment_id: &str) -> Result<(Attachment, Vec<u8>)> {
        let attachment = self.get(attachment_id).await?;
        if attachment.note_id != note_id {
            return Err(Error::NotFound("Attachment not found".to_string()));
        }
        if !self.backend.exists(&attachment.filename).await? {
            warn!(
                subsystem = "storage",
                component = "attachments",
                op = "download",
                attachment_id = %attachment.id,
                stored_name = %attachment.filename,
                "Attachment file missing from storage"
            );
            return Err(Error::NotFound("Attachment file not found".to_string()));
        }
        let data = self.backend.read(&attachment.filename).await?;
        Ok((attachment, data))
    }

    /// Write the file, then record it. The file is removed again if the
    /// insert fails.
    pub async fn store(
        &self,
        note_id: &str,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<Attachment> {
        let note_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(note_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if !note_exists {
            return Err(Error::NotFound("Note not found".to_string()));
        }

        let filename = stored_filename(original_name);
        self.backend.write(&filename, data).await?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO attachments (id, note_id, filename, original_name, mime_type, size)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            ATTACHMENT_COLUMNS
        ))
        .bind(new_id())
        .bind(note_id)
        .bind(&filename)
        .bind(original_name)
        .bind(mime_type)
        .bind(data.len() as i64)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => {
                let attachment = attachment_from_row(&row);
                info!(
                    subsystem = "database",
                    component = "attachments",
                    op = "store",
                    note_id = %note_id,
                    attachment_id = %attachment.id,
                    size = attachment.size,
                    "Attachment stored"
                );
                Ok(attachment)
            }
            Err(e) => {
                if let Err(cleanup) = self.backend.delete(&filename).await {
                    warn!(stored_name = %filename, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(Error::Database(e))
            }
        }
    }

    /// Delete one attachment of a note and its file.
    pub async fn delete(&self, note_id: &str, attachment_id: &str) -> Result<()> {
        let filename: String = sqlx::query_scalar(
            "DELETE FROM attachments WHERE id = $1 AND note_id = $2 RETURNING filename",
        )
        .bind(attachment_id)
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound("Attachment not found".to_string()))?;

        self.remove_files(std::slice::from_ref(&filename)).await;
        Ok(())
    }

    /// Stored filenames of one note's attachments.
    pub async fn filenames_for_note(&self, note_id: &str) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT filename FROM attachments WHERE note_id = $1")
            .bind(note_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    /// Stored filenames of every attachment on a trashed note.
    pub async fn filenames_for_trashed_notes(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT a.filename FROM attachments a
             JOIN notes n ON n.id = a.note_id
             WHERE n.deleted_at IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// Remove every stored file, including ones with no record.
    pub async fn clear_files(&self) -> Result<u64> {
        self.backend.clear().await
    }

    /// Best-effort removal of files whose rows are already gone.
    pub async fn remove_files(&self, filenames: &[String]) {
        for filename in filenames {
            if let Err(e) = self.backend.delete(filename).await {
                warn!(
                    subsystem = "storage",
                    component = "attachments",
                    op = "remove_file",
                    stored_name = %filename,
                    error = %e,
                    "Failed to remove attachment file"
                );
            }
        }
    }
}
