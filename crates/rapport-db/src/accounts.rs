//! Account repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::info;

use rapport_core::{
    new_id, Account, AccountRepository, CreateAccountRequest, Error, Result, UpdateAccountRequest,
};

use crate::query_params::{bind_params, QueryParam, UpdateBuilder};

pub(crate) const ACCOUNT_COLUMNS: &str =
    "id, name, account_owner, budget, est_engineers, created_at, updated_at";

pub(crate) fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        name: row.get("name"),
        account_owner: row.get("account_owner"),
        budget: row.get("budget"),
        est_engineers: row.get("est_engineers"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of AccountRepository.
pub struct PgAccountRepository {
    pool: Pool<Postgres>,
}

impl PgAccountRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert an account inside an open transaction.
    pub(crate) async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        name: &str,
        account_owner: &str,
    ) -> Result<Account> {
        let row = sqlx::query(&format!(
            "INSERT INTO accounts (id, name, account_owner) VALUES ($1, $2, $3) RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(new_id())
        .bind(name)
        .bind(account_owner)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(account_from_row(&row))
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn list(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM accounts ORDER BY name, created_at",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(account_from_row).collect())
    }

    async fn get(&self, id: &str) -> Result<Account> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound("Account not found".to_string()))?;
        Ok(account_from_row(&row))
    }

    async fn create(&self, req: CreateAccountRequest) -> Result<Account> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Account name is required".to_string()));
        }

        let row = sqlx::query(&format!(
            "INSERT INTO accounts (id, name, account_owner, budget, est_engineers)
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(new_id())
        .bind(name)
        .bind(req.account_owner.trim())
        .bind(req.budget)
        .bind(req.est_engineers)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let account = account_from_row(&row);
        info!(
            subsystem = "database",
            component = "accounts",
            op = "create",
            account_id = %account.id,
            "Account created"
        );
        Ok(account)
    }

    async fn update(&self, id: &str, req: UpdateAccountRequest) -> Result<Account> {
        if req.is_empty() {
            return Err(Error::InvalidInput("No fields to update".to_string()));
        }
        if matches!(req.name.as_deref().map(str::trim), Some("")) {
            return Err(Error::InvalidInput("Account name cannot be empty".to_string()));
        }

        let mut builder = UpdateBuilder::new("accounts");
        builder
            .set_opt("name", req.name, |v| QueryParam::Text(v.trim().to_string()))
            .set_opt("account_owner", req.account_owner, QueryParam::Text)
            .set_opt("budget", req.budget, |v| QueryParam::Float(Some(v)))
            .set_opt("est_engineers", req.est_engineers, |v| {
                QueryParam::Int(Some(v))
            });
        let (sql, params) = builder.build_for_id(id, None, Some(ACCOUNT_COLUMNS));

        let row = bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("Account not found".to_string()))?;
        Ok(account_from_row(&row))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Account not found".to_string()));
        }
        info!(
            subsystem = "database",
            component = "accounts",
            op = "delete",
            account_id = %id,
            "Account deleted"
        );
        Ok(())
    }

    async fn get_or_create_by_name(&self, name: &str) -> Result<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Account name is required".to_string()));
        }

        let existing = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE name = $1 ORDER BY created_at LIMIT 1",
            ACCOUNT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        if let Some(row) = existing {
            return Ok(account_from_row(&row));
        }

        self.create(CreateAccountRequest {
            name: name.to_string(),
            ..Default::default()
        })
        .await
    }
}
