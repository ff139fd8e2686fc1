//! Activity log repository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use rapport_core::{new_id, Activity, ActivityRepository, CreateActivityRequest, Error, Result};

const ACTIVITY_COLUMNS: &str =
    "id, account_id, type, title, description, entity_type, entity_id, created_at";

fn activity_from_row(row: &PgRow) -> Activity {
    Activity {
        id: row.get("id"),
        account_id: row.get("account_id"),
        activity_type: row.get("type"),
        title: row.get("title"),
        description: row.get("description"),
        entity_type: row.get("entity_type"),
        entity_id: row.get("entity_id"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of ActivityRepository.
pub struct PgActivityRepository {
    pool: Pool<Postgres>,
}

impl PgActivityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn list_for_account(&self, account_id: &str, limit: i64) -> Result<Vec<Activity>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM activities WHERE account_id = $1
             ORDER BY created_at DESC, id DESC LIMIT $2",
            ACTIVITY_COLUMNS
        ))
        .bind(account_id)
        .bind(limit.max(1))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(activity_from_row).collect())
    }

    async fn create(&self, req: CreateActivityRequest) -> Result<Activity> {
        if req.account_id.trim().is_empty() {
            return Err(Error::InvalidInput("account_id is required".to_string()));
        }
        if req.activity_type.trim().is_empty() {
            return Err(Error::InvalidInput("type is required".to_string()));
        }
        if req.title.trim().is_empty() {
            return Err(Error::InvalidInput("title is required".to_string()));
        }

        let row = sqlx::query(&format!(
            "INSERT INTO activities (id, account_id, type, title, description, entity_type, entity_id)
             SELECT $1, $2, $3, $4, $5, $6, $7
             WHERE EXISTS (SELECT 1 FROM accounts WHERE id = $2)
             RETURNING {}",
            ACTIVITY_COLUMNS
        ))
        .bind(new_id())
        .bind(req.account_id.trim())
        .bind(req.activity_type.trim())
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(&req.entity_type)
        .bind(&req.entity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::InvalidInput("Account not found".to_string()))?;
        Ok(activity_from_row(&row))
    }
}
