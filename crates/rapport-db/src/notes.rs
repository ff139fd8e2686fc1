//! Note repository implementation.
//!
//! Notes move through the deletion lifecycle Active -> Trashed -> Purged.
//! Every default read uses the active-row predicate; the trash view is the
//! only place trashed notes appear.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};

use rapport_core::defaults::DEFAULT_TEMPLATE_TYPE;
use rapport_core::{
    new_id, CreateNoteRequest, Error, Note, NoteListScope, NoteRef, NoteRepository, Result,
    UpdateNoteRequest,
};

use crate::attachments::list_for_note as attachments_for_note;
use crate::query_params::{bind_params, QueryParam, UpdateBuilder};
use crate::tags::tags_for_note;
use crate::todos::todos_for_note;

pub(crate) const NOTE_SELECT: &str = r#"
    SELECT n.id, n.title, n.account_id, a.name AS account_name, n.template_type,
           n.internal_participants, n.external_participants, n.content,
           n.meeting_id, n.meeting_date, n.pinned, n.archived, n.sort_order,
           n.deleted_at, n.created_at, n.updated_at
    FROM notes n
    JOIN accounts a ON a.id = n.account_id
"#;

pub(crate) fn note_from_row(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        account_id: row.get("account_id"),
        account_name: row.get("account_name"),
        template_type: row.get("template_type"),
        internal_participants: row.get("internal_participants"),
        external_participants: row.get("external_participants"),
        content: row.get("content"),
        meeting_id: row.get("meeting_id"),
        meeting_date: row.get("meeting_date"),
        pinned: row.get("pinned"),
        archived: row.get("archived"),
        sort_order: row.get("sort_order"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        todos: Vec::new(),
        tags: Vec::new(),
        attachments: Vec::new(),
    }
}

pub(crate) fn note_ref_from_row(row: &PgRow) -> NoteRef {
    NoteRef {
        id: row.get("id"),
        title: row.get("title"),
        account_id: row.get("account_id"),
        account_name: row.get("account_name"),
        meeting_date: row.get("meeting_date"),
        created_at: row.get("created_at"),
    }
}

/// Trim entries and drop blanks, keeping order.
pub(crate) fn clean_participants(participants: Vec<String>) -> Vec<String> {
    participants
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn list_sql(scope: NoteListScope) -> String {
    let (predicate, order) = match scope {
        NoteListScope::Active => (
            "n.deleted_at IS NULL AND n.archived = FALSE",
            "n.pinned DESC, COALESCE(n.meeting_date, n.created_at) DESC",
        ),
        NoteListScope::Archived => (
            "n.deleted_at IS NULL AND n.archived = TRUE",
            "n.updated_at DESC",
        ),
        NoteListScope::Trash => ("n.deleted_at IS NOT NULL", "n.deleted_at DESC"),
    };
    format!("{} WHERE {} ORDER BY {}", NOTE_SELECT, predicate, order)
}

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn account_exists(&self, account_id: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn toggle_flag(&self, id: &str, column: &'static str) -> Result<bool> {
        let sql = format!(
            "UPDATE notes SET {col} = NOT {col}, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL RETURNING {col}",
            col = column
        );
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn list(&self, scope: NoteListScope) -> Result<Vec<Note>> {
        let rows = sqlx::query(&list_sql(scope))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn list_by_account(&self, account_id: &str) -> Result<Vec<Note>> {
        let sql = format!(
            "{} WHERE n.account_id = $1 AND n.deleted_at IS NULL AND n.archived = FALSE
             ORDER BY n.pinned DESC, n.sort_order, COALESCE(n.meeting_date, n.created_at) DESC",
            NOTE_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn get(&self, id: &str) -> Result<Note> {
        let sql = format!("{} WHERE n.id = $1 AND n.deleted_at IS NULL", NOTE_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))?;

        let mut note = note_from_row(&row);
        note.todos = todos_for_note(&self.pool, id).await?;
        note.tags = tags_for_note(&self.pool, id).await?;
        note.attachments = attachments_for_note(&self.pool, id).await?;
        Ok(note)
    }

    async fn create(&self, req: CreateNoteRequest) -> Result<Note> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("Title is required".to_string()));
        }
        let account_id = req.account_id.trim();
        if account_id.is_empty() {
            return Err(Error::InvalidInput("account_id is required".to_string()));
        }
        if !self.account_exists(account_id).await? {
            return Err(Error::InvalidInput("Account not found".to_string()));
        }

        let template_type = req
            .template_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TEMPLATE_TYPE);
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO notes (id, title, account_id, template_type, internal_participants,
                               external_participants, content, meeting_id, meeting_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&id)
        .bind(title)
        .bind(account_id)
        .bind(template_type)
        .bind(clean_participants(req.internal_participants))
        .bind(clean_participants(req.external_participants))
        .bind(&req.content)
        .bind(&req.meeting_id)
        .bind(req.meeting_date)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "notes",
            op = "create",
            note_id = %id,
            account_id = %account_id,
            "Note created"
        );
        self.get(&id).await
    }

    async fn update(&self, id: &str, req: UpdateNoteRequest) -> Result<Note> {
        if req.is_empty() {
            return Err(Error::InvalidInput("No fields to update".to_string()));
        }
        if matches!(req.title.as_deref().map(str::trim), Some("")) {
            return Err(Error::InvalidInput("Title cannot be empty".to_string()));
        }
        if let Some(account_id) = req.account_id.as_deref() {
            if !self.account_exists(account_id).await? {
                return Err(Error::InvalidInput("Account not found".to_string()));
            }
        }

        let mut builder = UpdateBuilder::new("notes");
        builder
            .set_opt("title", req.title, |v| QueryParam::Text(v.trim().to_string()))
            .set_opt("account_id", req.account_id, QueryParam::Text)
            .set_opt("template_type", req.template_type, QueryParam::Text)
            .set_opt("internal_participants", req.internal_participants, |v| {
                QueryParam::TextArray(clean_participants(v))
            })
            .set_opt("external_participants", req.external_participants, |v| {
                QueryParam::TextArray(clean_participants(v))
            })
            .set_opt("content", req.content, QueryParam::Text)
            .set_opt("meeting_id", req.meeting_id, |v| QueryParam::OptText(Some(v)))
            .set_opt("meeting_date", req.meeting_date, QueryParam::Timestamp)
            .set_opt("pinned", req.pinned, QueryParam::Bool)
            .set_opt("archived", req.archived, QueryParam::Bool)
            .set_opt("sort_order", req.sort_order, |v| QueryParam::Int(Some(v)));
        let (sql, params) = builder.build_for_id(id, Some("deleted_at IS NULL"), Some("id"));

        bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("Note not found".to_string()))?;

        debug!(
            subsystem = "database",
            component = "notes",
            op = "update",
            note_id = %id,
            "Note updated"
        );
        self.get(id).await
    }

    async fn soft_delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notes SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Note not found".to_string()));
        }
        Ok(())
    }

    async fn restore(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notes SET deleted_at = NULL, updated_at = now()
             WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Note not found in trash".to_string()));
        }
        Ok(())
    }

    async fn purge(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Note not found".to_string()));
        }
        info!(
            subsystem = "database",
            component = "notes",
            op = "purge",
            note_id = %id,
            "Note permanently deleted"
        );
        Ok(())
    }

    async fn empty_trash(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notes WHERE deleted_at IS NOT NULL")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        info!(
            subsystem = "database",
            component = "notes",
            op = "empty_trash",
            rows_affected = result.rows_affected(),
            "Trash emptied"
        );
        Ok(result.rows_affected())
    }

    async fn toggle_pin(&self, id: &str) -> Result<bool> {
        self.toggle_flag(id, "pinned").await
    }

    async fn toggle_archive(&self, id: &str) -> Result<bool> {
        self.toggle_flag(id, "archived").await
    }

    async fn reorder(&self, account_id: &str, note_ids: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        for (position, note_id) in note_ids.iter().enumerate() {
            sqlx::query(
                "UPDATE notes SET sort_order = $1, updated_at = now()
                 WHERE id = $2 AND account_id = $3",
            )
            .bind(position as i32)
            .bind(note_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}
