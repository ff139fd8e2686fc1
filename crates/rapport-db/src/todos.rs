//! Todo repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::info;

use rapport_core::{
    new_id, CreateTodoRequest, Error, NoteRef, Result, Todo, TodoRepository, TodoStatus,
    UpdateTodoRequest,
};

use crate::notes::note_ref_from_row;
use crate::query_params::{bind_params, QueryParam, UpdateBuilder, WhereBuilder};

pub(crate) const TODO_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.status, t.priority, t.due_date,
           t.account_id, a.name AS account_name, t.pinned, t.deleted_at,
           t.created_at, t.updated_at
    FROM todos t
    LEFT JOIN accounts a ON a.id = t.account_id
"#;

pub(crate) fn todo_from_row(row: &PgRow) -> Todo {
    let status: String = row.get("status");
    let priority: String = row.get("priority");
    Todo {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        // CHECK constraints keep these columns within the enums
        status: status.parse().unwrap_or_default(),
        priority: priority.parse().unwrap_or_default(),
        due_date: row.get("due_date"),
        account_id: row.get("account_id"),
        account_name: row.get("account_name"),
        pinned: row.get("pinned"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        notes: Vec::new(),
    }
}

/// Active todos linked to a note, oldest first.
pub(crate) async fn todos_for_note(pool: &Pool<Postgres>, note_id: &str) -> Result<Vec<Todo>> {
    let sql = format!(
        "{} JOIN note_todos nt ON nt.todo_id = t.id
         WHERE nt.note_id = $1 AND t.deleted_at IS NULL
         ORDER BY t.created_at",
        TODO_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(note_id)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)?;
    Ok(rows.iter().map(todo_from_row).collect())
}

/// PostgreSQL implementation of TodoRepository.
pub struct PgTodoRepository {
    pool: Pool<Postgres>,
}

impl PgTodoRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Attach linked active notes to each todo with one query.
    async fn attach_notes(&self, todos: &mut [Todo]) -> Result<()> {
        if todos.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = todos.iter().map(|t| t.id.clone()).collect();
        let rows = sqlx::query(
            r#"
            SELECT nt.todo_id, n.id, n.title, n.account_id, a.name AS account_name,
                   n.meeting_date, n.created_at
            FROM note_todos nt
            JOIN notes n ON n.id = nt.note_id AND n.deleted_at IS NULL
            JOIN accounts a ON a.id = n.account_id
            WHERE nt.todo_id = ANY($1)
            ORDER BY COALESCE(n.meeting_date, n.created_at) DESC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_todo: HashMap<String, Vec<NoteRef>> = HashMap::new();
        for row in &rows {
            let todo_id: String = row.get("todo_id");
            by_todo
                .entry(todo_id)
                .or_default()
                .push(note_ref_from_row(row));
        }
        for todo in todos.iter_mut() {
            if let Some(notes) = by_todo.remove(&todo.id) {
                todo.notes = notes;
            }
        }
        Ok(())
    }

    async fn fetch(&self, id: &str, active_only: bool) -> Result<Option<Todo>> {
        let predicate = if active_only {
            " AND t.deleted_at IS NULL"
        } else {
            ""
        };
        let sql = format!("{} WHERE t.id = $1{}", TODO_SELECT, predicate);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(todo_from_row))
    }

    async fn ensure_account(&self, account_id: &str) -> Result<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if exists {
            Ok(())
        } else {
            Err(Error::InvalidInput("Account not found".to_string()))
        }
    }

    async fn ensure_active_note(&self, note_id: &str) -> Result<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(note_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if exists {
            Ok(())
        } else {
            Err(Error::NotFound("Note not found".to_string()))
        }
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn list(&self, status: Option<TodoStatus>) -> Result<Vec<Todo>> {
        let mut filter = WhereBuilder::new();
        filter.push("t.deleted_at IS NULL");
        if let Some(status) = status {
            filter.push_param(
                "t.status = {}",
                QueryParam::Text(status.as_str().to_string()),
            );
        }
        let sql = format!(
            "{} {} ORDER BY t.pinned DESC, t.due_date ASC NULLS LAST, t.created_at DESC",
            TODO_SELECT,
            filter.clause()
        );
        let rows = bind_params(sqlx::query(&sql), filter.params())
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut todos: Vec<Todo> = rows.iter().map(todo_from_row).collect();
        self.attach_notes(&mut todos).await?;
        Ok(todos)
    }

    async fn list_deleted(&self) -> Result<Vec<Todo>> {
        let sql = format!(
            "{} WHERE t.deleted_at IS NOT NULL ORDER BY t.deleted_at DESC",
            TODO_SELECT
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(todo_from_row).collect())
    }

    async fn get(&self, id: &str) -> Result<Todo> {
        let mut todo = self
            .fetch(id, true)
            .await?
            .ok_or_else(|| Error::NotFound("Todo not found".to_string()))?;
        self.attach_notes(std::slice::from_mut(&mut todo)).await?;
        Ok(todo)
    }

    async fn create(&self, req: CreateTodoRequest) -> Result<Todo> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("Title is required".to_string()));
        }
        let account_id = req
            .account_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if let Some(account_id) = account_id {
            self.ensure_account(account_id).await?;
        }
        let note_id = req
            .note_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if let Some(note_id) = note_id {
            self.ensure_active_note(note_id).await?;
        }

        let id = new_id();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        sqlx::query(
            r#"
            INSERT INTO todos (id, title, description, status, priority, due_date, account_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&id)
        .bind(title)
        .bind(&req.description)
        .bind(req.status.as_str())
        .bind(req.priority.as_str())
        .bind(req.due_date)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if let Some(note_id) = note_id {
            sqlx::query(
                "INSERT INTO note_todos (note_id, todo_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(note_id)
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "todos",
            op = "create",
            todo_id = %id,
            "Todo created"
        );
        self.get(&id).await
    }

    async fn update(&self, id: &str, req: UpdateTodoRequest) -> Result<Todo> {
        if req.is_empty() {
            return Err(Error::InvalidInput("No fields to update".to_string()));
        }
        if matches!(req.title.as_deref().map(str::trim), Some("")) {
            return Err(Error::InvalidInput("Title cannot be empty".to_string()));
        }
        // Some("") clears the account
        let account_id = req.account_id.map(|id| {
            let id = id.trim().to_string();
            (!id.is_empty()).then_some(id)
        });
        if let Some(Some(account_id)) = account_id.as_ref() {
            self.ensure_account(account_id).await?;
        }

        let mut builder = UpdateBuilder::new("todos");
        builder
            .set_opt("title", req.title, |v| QueryParam::Text(v.trim().to_string()))
            .set_opt("description", req.description, QueryParam::Text)
            .set_opt("status", req.status, |v| {
                QueryParam::Text(v.as_str().to_string())
            })
            .set_opt("priority", req.priority, |v| {
                QueryParam::Text(v.as_str().to_string())
            })
            .set_opt("due_date", req.due_date, |v| QueryParam::Timestamp(Some(v)))
            .set_opt("account_id", account_id, QueryParam::OptText)
            .set_opt("pinned", req.pinned, QueryParam::Bool);
        let (sql, params) = builder.build_for_id(id, Some("deleted_at IS NULL"), Some("id"));

        bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("Todo not found".to_string()))?;
        self.get(id).await
    }

    async fn soft_delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE todos SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Todo not found".to_string()));
        }
        Ok(())
    }

    async fn restore(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE todos SET deleted_at = NULL, updated_at = now()
             WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Todo not found in trash".to_string()));
        }
        Ok(())
    }

    async fn purge(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Todo not found".to_string()));
        }
        Ok(())
    }

    async fn toggle_pin(&self, id: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "UPDATE todos SET pinned = NOT pinned, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL RETURNING pinned",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound("Todo not found".to_string()))
    }

    async fn link_note(&self, todo_id: &str, note_id: &str) -> Result<()> {
        if self.fetch(todo_id, true).await?.is_none() {
            return Err(Error::NotFound("Todo not found".to_string()));
        }
        self.ensure_active_note(note_id).await?;

        sqlx::query(
            "INSERT INTO note_todos (note_id, todo_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(note_id)
        .bind(todo_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn unlink_note(&self, todo_id: &str, note_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM note_todos WHERE note_id = $1 AND todo_id = $2")
            .bind(note_id)
            .bind(todo_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Link not found".to_string()));
        }
        Ok(())
    }
}
