//! Fire-and-forget contact extraction after a note save.
//!
//! The note response never waits for extraction and never sees its errors.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use rapport_core::ContactRepository;
use rapport_db::Database;

/// Spawn contact resolution for every participant of a saved note.
///
/// Returns the task handle so tests can await completion; request handlers
/// drop it.
pub fn dispatch_contact_extraction(
    db: Arc<Database>,
    note_id: String,
    internal_participants: Vec<String>,
    external_participants: Vec<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if internal_participants.is_empty() && external_participants.is_empty() {
            debug!(
                subsystem = "contacts",
                component = "contact_extraction",
                note_id = %note_id,
                "No participants to extract"
            );
            return;
        }

        let start = Instant::now();
        let summary = db
            .contacts
            .extract_from_note(&internal_participants, &external_participants)
            .await;
        info!(
            subsystem = "contacts",
            component = "contact_extraction",
            op = "extract_from_note",
            note_id = %note_id,
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Contacts extracted from note"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapport_core::InternalDomain;
    use rapport_db::{create_lazy_pool, PoolConfig};

    #[tokio::test]
    async fn test_extraction_failures_stay_inside_the_task() {
        let pool = create_lazy_pool("postgres://rapport@localhost/unused", PoolConfig::default())
            .unwrap();
        pool.close().await;
        let db = Arc::new(Database::new(pool, InternalDomain::new("example.com").unwrap()));

        let summary = db
            .contacts
            .extract_from_note(&["dana@example.com".to_string()], &[])
            .await;
        assert_eq!(summary.created, 0);
        assert_eq!(summary.failed, 1);

        let handle = dispatch_contact_extraction(
            db,
            "note-1".to_string(),
            vec!["dana@example.com".to_string()],
            vec!["not-an-email".to_string(), "lee@partner.io".to_string()],
        );

        assert!(handle.await.is_ok());
    }
}
