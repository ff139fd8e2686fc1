//! # rapport-db
//!
//! PostgreSQL database layer for rapport.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for accounts, notes, todos, tags and activities
//! - Contact resolution (upsert by email, domain-based account suggestions)
//! - The lookups behind unified search
//! - Filesystem storage for note attachments
//!
//! ## Example
//!
//! ```rust,ignore
//! use rapport_db::{Database, InternalDomain, NoteRepository, NoteListScope};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let internal = InternalDomain::new("example.com")?;
//!     let db = Database::connect("postgres://localhost/rapport", internal).await?;
//!     let notes = db.notes.list(NoteListScope::Active).await?;
//!     println!("{} active notes", notes.len());
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod activities;
pub mod analytics;
pub mod attachments;
pub mod contacts;
pub mod file_storage;
pub mod notes;
pub mod pool;
pub mod query_params;
pub mod search;
pub mod tags;
pub mod todos;

// Always compiled so integration tests (in tests/) can use it
pub mod test_fixtures;

use std::sync::Arc;

// Re-export core types
pub use rapport_core::*;

pub use accounts::PgAccountRepository;
pub use activities::PgActivityRepository;
pub use analytics::{missing_fields, DataExporter, PgAnalyticsRepository};
pub use attachments::PgAttachmentRepository;
pub use contacts::{suggestion_pattern, PgContactRepository};
pub use file_storage::{sanitize_filename, stored_filename, FilesystemBackend, StorageBackend};
pub use notes::PgNoteRepository;
pub use pool::{create_lazy_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use query_params::{QueryParam, UpdateBuilder, WhereBuilder};
pub use search::PgSearchRepository;
pub use tags::PgTagRepository;
pub use todos::PgTodoRepository;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub accounts: PgAccountRepository,
    pub notes: PgNoteRepository,
    pub todos: PgTodoRepository,
    pub tags: PgTagRepository,
    pub activities: PgActivityRepository,
    /// Contacts and contact resolution, bound to the internal domain.
    pub contacts: PgContactRepository,
    /// Lookups consumed by the unified search engine.
    pub search: Arc<PgSearchRepository>,
    pub analytics: PgAnalyticsRepository,
    pub export: DataExporter,
    /// Attachment storage. Use `with_filesystem_storage` to configure.
    pub attachments: Option<PgAttachmentRepository>,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>, internal_domain: InternalDomain) -> Self {
        Self {
            accounts: PgAccountRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            todos: PgTodoRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            activities: PgActivityRepository::new(pool.clone()),
            contacts: PgContactRepository::new(pool.clone(), internal_domain.clone()),
            search: Arc::new(PgSearchRepository::new(pool.clone())),
            analytics: PgAnalyticsRepository::new(pool.clone()),
            export: DataExporter::new(pool.clone(), internal_domain),
            attachments: None,
            pool,
        }
    }

    /// Store attachments under `path` on the local filesystem.
    pub fn with_filesystem_storage(mut self, path: &str) -> Self {
        self.attachments = Some(PgAttachmentRepository::new(
            self.pool.clone(),
            Arc::new(FilesystemBackend::new(path)),
        ));
        self
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str, internal_domain: InternalDomain) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool, internal_domain))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(
        url: &str,
        config: PoolConfig,
        internal_domain: InternalDomain,
    ) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool, internal_domain))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Delete every row of user data in one transaction.
    ///
    /// Attachment files are not touched; see
    /// [`PgAttachmentRepository::clear_files`].
    pub async fn clear_all_data(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        sqlx::query(
            "TRUNCATE note_todos, note_tags, attachments, activities, contacts,
                      todos, notes, tags, accounts CASCADE",
        )
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;
        tx.commit().await.map_err(Error::Database)?;

        tracing::info!(
            subsystem = "database",
            op = "clear_all_data",
            "All user data cleared"
        );
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Contact-resolution internal domain.
    pub fn internal_domain(&self) -> &InternalDomain {
        self.contacts.internal_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\dir"), "c:\\\\dir");
    }
}
