//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use rapport_core::defaults::DEFAULT_TAG_COLOR;
use rapport_core::{new_id, Error, Result, Tag, TagRepository};

use crate::query_params::{bind_params, QueryParam, UpdateBuilder};

const TAG_COLUMNS: &str = "id, name, color, created_at";

fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

/// Turn a unique-name violation into a conflict.
fn map_tag_write_error(e: sqlx::Error) -> Error {
    let err = Error::Database(e);
    if err.is_unique_violation() {
        Error::Conflict("A tag with this name already exists".to_string())
    } else {
        err
    }
}

pub(crate) async fn tags_for_note(pool: &Pool<Postgres>, note_id: &str) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        "SELECT t.id, t.name, t.color, t.created_at
         FROM tags t JOIN note_tags nt ON nt.tag_id = t.id
         WHERE nt.note_id = $1 ORDER BY t.name",
    )
    .bind(note_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)?;
    Ok(rows.iter().map(tag_from_row).collect())
}

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query(&format!("SELECT {} FROM tags ORDER BY name", TAG_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn create(&self, name: &str, color: Option<&str>) -> Result<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Tag name is required".to_string()));
        }
        let color = color
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_TAG_COLOR);

        let row = sqlx::query(&format!(
            "INSERT INTO tags (id, name, color) VALUES ($1, $2, $3) RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(new_id())
        .bind(name)
        .bind(color)
        .fetch_one(&self.pool)
        .await
        .map_err(map_tag_write_error)?;
        Ok(tag_from_row(&row))
    }

    async fn update(&self, id: &str, name: Option<&str>, color: Option<&str>) -> Result<Tag> {
        if name.is_none() && color.is_none() {
            return Err(Error::InvalidInput("No fields to update".to_string()));
        }
        let name = name.map(str::trim);
        if name == Some("") {
            return Err(Error::InvalidInput("Tag name cannot be empty".to_string()));
        }

        let mut builder = UpdateBuilder::new("tags").without_timestamp();
        builder
            .set_opt("name", name, |v| QueryParam::Text(v.to_string()))
            .set_opt("color", color, |v| QueryParam::Text(v.trim().to_string()));
        let (sql, params) = builder.build_for_id(id, None, Some(TAG_COLUMNS));

        let row = bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_tag_write_error)?
            .ok_or_else(|| Error::NotFound("Tag not found".to_string()))?;
        Ok(tag_from_row(&row))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Tag not found".to_string()));
        }
        Ok(())
    }

    async fn list_for_note(&self, note_id: &str) -> Result<Vec<Tag>> {
        tags_for_note(&self.pool, note_id).await
    }

    async fn add_to_note(&self, note_id: &str, tag_id: &str) -> Result<()> {
        let (note_exists, tag_exists): (bool, bool) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = $1 AND deleted_at IS NULL),
                    EXISTS(SELECT 1 FROM tags WHERE id = $2)",
        )
        .bind(note_id)
        .bind(tag_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if !note_exists {
            return Err(Error::NotFound("Note not found".to_string()));
        }
        if !tag_exists {
            return Err(Error::NotFound("Tag not found".to_string()));
        }

        sqlx::query(
            "INSERT INTO note_tags (note_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(note_id)
        .bind(tag_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn remove_from_note(&self, note_id: &str, tag_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM note_tags WHERE note_id = $1 AND tag_id = $2")
            .bind(note_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
