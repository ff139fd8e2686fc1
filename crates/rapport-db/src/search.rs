//! PostgreSQL lookups behind unified search.
//!
//! Note bodies go through the GIN full-text index; participants, accounts and
//! todos are matched by case-insensitive containment. Trashed rows never match.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use rapport_core::defaults::{HIGHLIGHT_START, HIGHLIGHT_STOP, TEXT_SEARCH_CONFIG};
use rapport_core::{
    AccountHit, Error, NoteParticipantHit, NoteTextHit, Result, SearchSource, TodoHit,
};

use crate::escape_like;

/// `ts_headline` options: short excerpt with the match wrapped in `<mark>`.
fn headline_options() -> String {
    format!(
        "StartSel={}, StopSel={}, MaxWords=20, MinWords=5, MaxFragments=1",
        HIGHLIGHT_START, HIGHLIGHT_STOP
    )
}

fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(needle))
}

/// PostgreSQL implementation of SearchSource.
pub struct PgSearchRepository {
    pool: Pool<Postgres>,
}

impl PgSearchRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchSource for PgSearchRepository {
    async fn notes_by_text(&self, tsquery: &str, limit: i64) -> Result<Vec<NoteTextHit>> {
        let start = Instant::now();
        // The headline comes from the content when it matches, otherwise the title.
        let sql = format!(
            r#"
            WITH q AS (SELECT to_tsquery('{cfg}', $1) AS query)
            SELECT n.id, n.title, n.account_id,
                   CASE
                       WHEN to_tsvector('{cfg}', n.content) @@ q.query
                       THEN ts_headline('{cfg}', n.content, q.query, $2)
                       ELSE ts_headline('{cfg}', n.title, q.query, $2)
                   END AS headline
            FROM notes n, q
            WHERE n.deleted_at IS NULL
              AND to_tsvector('{cfg}', n.title || ' ' || n.content) @@ q.query
            ORDER BY ts_rank(to_tsvector('{cfg}', n.title || ' ' || n.content), q.query) DESC,
                     n.updated_at DESC
            LIMIT $3
            "#,
            cfg = TEXT_SEARCH_CONFIG
        );
        let rows = sqlx::query(&sql)
            .bind(tsquery)
            .bind(headline_options())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "search",
            component = "postgres",
            op = "notes_by_text",
            result_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Full-text note lookup"
        );

        Ok(rows
            .into_iter()
            .map(|row| NoteTextHit {
                id: row.get("id"),
                title: row.get("title"),
                account_id: row.get("account_id"),
                headline: row.get("headline"),
            })
            .collect())
    }

    async fn notes_by_participant(
        &self,
        needle: &str,
        limit: i64,
    ) -> Result<Vec<NoteParticipantHit>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.title, n.account_id
            FROM notes n
            WHERE n.deleted_at IS NULL
              AND (array_to_string(n.internal_participants, ' ') ILIKE $1
                   OR array_to_string(n.external_participants, ' ') ILIKE $1)
            ORDER BY n.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(needle))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| NoteParticipantHit {
                id: row.get("id"),
                title: row.get("title"),
                account_id: row.get("account_id"),
            })
            .collect())
    }

    async fn accounts(&self, needle: &str, limit: i64) -> Result<Vec<AccountHit>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, account_owner
            FROM accounts
            WHERE name ILIKE $1 OR account_owner ILIKE $1
            ORDER BY name
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(needle))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| AccountHit {
                id: row.get("id"),
                name: row.get("name"),
                account_owner: row.get("account_owner"),
            })
            .collect())
    }

    async fn todos(&self, needle: &str, limit: i64) -> Result<Vec<TodoHit>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.title, t.description, t.account_id, a.name AS account_name
            FROM todos t
            LEFT JOIN accounts a ON a.id = t.account_id
            WHERE t.deleted_at IS NULL
              AND (t.title ILIKE $1 OR t.description ILIKE $1)
            ORDER BY t.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(needle))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TodoHit {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                account_id: row.get("account_id"),
                account_name: row.get("account_name"),
            })
            .collect())
    }
}
