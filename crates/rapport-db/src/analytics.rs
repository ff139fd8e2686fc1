//! Dashboard analytics and data export.
//!
//! The catch-all "Unassigned" account is left out of every analytics figure.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use rapport_core::defaults::UNASSIGNED_ACCOUNT;
use rapport_core::{
    AccountNoteCount, AccountRepository, Analytics, ContactRepository, DataExport, Error,
    IncompleteNote, InternalDomain, ListContactsRequest, NoteListScope, NoteRepository, Result,
    TagRepository, TodoRepository,
};

use crate::accounts::PgAccountRepository;
use crate::contacts::PgContactRepository;
use crate::notes::PgNoteRepository;
use crate::tags::PgTagRepository;
use crate::todos::PgTodoRepository;

/// Names of the fields a note or its account still lacks.
pub fn missing_fields(
    budget: Option<f64>,
    est_engineers: Option<i32>,
    account_owner: &str,
    content: &str,
    internal_participants: &[String],
) -> Vec<String> {
    let mut missing = Vec::new();
    if budget.is_none() {
        missing.push("budget");
    }
    if est_engineers.is_none() {
        missing.push("est_engineers");
    }
    if account_owner.trim().is_empty() {
        missing.push("account_owner");
    }
    if content.trim().is_empty() {
        missing.push("content");
    }
    if internal_participants.is_empty() {
        missing.push("internal_participants");
    }
    missing.into_iter().map(str::to_string).collect()
}

/// Read-only aggregate queries.
pub struct PgAnalyticsRepository {
    pool: Pool<Postgres>,
}

impl PgAnalyticsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn summary(&self) -> Result<Analytics> {
        let totals = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM notes n JOIN accounts a ON a.id = n.account_id
                  WHERE n.deleted_at IS NULL AND a.name <> $1) AS total_notes,
                (SELECT COUNT(*) FROM accounts WHERE name <> $1) AS total_accounts,
                (SELECT COUNT(*) FROM todos WHERE deleted_at IS NULL) AS total_todos,
                (SELECT COUNT(*) FROM notes n JOIN accounts a ON a.id = n.account_id
                  WHERE n.deleted_at IS NULL AND a.name <> $1
                    AND (a.budget IS NULL OR a.est_engineers IS NULL
                         OR TRIM(a.account_owner) = '' OR TRIM(n.content) = ''
                         OR cardinality(n.internal_participants) = 0)) AS incomplete_count
            "#,
        )
        .bind(UNASSIGNED_ACCOUNT)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let status_rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM todos WHERE deleted_at IS NULL GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        let todos_by_status: BTreeMap<String, i64> = status_rows
            .iter()
            .map(|row| (row.get("status"), row.get("count")))
            .collect();

        let account_rows = sqlx::query(
            r#"
            SELECT a.id, a.name, COUNT(n.id) AS note_count
            FROM accounts a
            LEFT JOIN notes n ON n.account_id = a.id AND n.deleted_at IS NULL
            WHERE a.name <> $1
            GROUP BY a.id, a.name
            ORDER BY note_count DESC, a.name
            "#,
        )
        .bind(UNASSIGNED_ACCOUNT)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        let notes_by_account = account_rows
            .iter()
            .map(|row| AccountNoteCount {
                account_id: row.get("id"),
                account_name: row.get("name"),
                note_count: row.get("note_count"),
            })
            .collect();

        Ok(Analytics {
            total_notes: totals.get("total_notes"),
            total_accounts: totals.get("total_accounts"),
            total_todos: totals.get("total_todos"),
            todos_by_status,
            notes_by_account,
            incomplete_count: totals.get("incomplete_count"),
        })
    }

    pub async fn incomplete_notes(&self) -> Result<Vec<IncompleteNote>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.title, a.name AS account_name, a.budget, a.est_engineers,
                   a.account_owner, n.content, n.internal_participants
            FROM notes n
            JOIN accounts a ON a.id = n.account_id
            WHERE n.deleted_at IS NULL AND a.name <> $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(UNASSIGNED_ACCOUNT)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let account_owner: String = row.get("account_owner");
                let content: String = row.get("content");
                let internal: Vec<String> = row.get("internal_participants");
                let missing = missing_fields(
                    row.get("budget"),
                    row.get("est_engineers"),
                    &account_owner,
                    &content,
                    &internal,
                );
                (!missing.is_empty()).then(|| IncompleteNote {
                    note_id: row.get("id"),
                    note_title: row.get("title"),
                    account_name: row.get("account_name"),
                    missing_fields: missing,
                })
            })
            .collect())
    }
}

/// Full JSON export of active data.
pub struct DataExporter {
    accounts: PgAccountRepository,
    notes: PgNoteRepository,
    todos: PgTodoRepository,
    tags: PgTagRepository,
    contacts: PgContactRepository,
}

impl DataExporter {
    pub fn new(pool: Pool<Postgres>, internal_domain: InternalDomain) -> Self {
        Self {
            accounts: PgAccountRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            todos: PgTodoRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            contacts: PgContactRepository::new(pool, internal_domain),
        }
    }

    pub async fn export(&self) -> Result<DataExport> {
        let mut notes = self.notes.list(NoteListScope::Active).await?;
        notes.extend(self.notes.list(NoteListScope::Archived).await?);

        Ok(DataExport {
            exported_at: Utc::now(),
            accounts: self.accounts.list().await?,
            notes,
            todos: self.todos.list(None).await?,
            tags: self.tags.list().await?,
            contacts: self.contacts.list(&ListContactsRequest::default()).await?,
        })
    }
}
