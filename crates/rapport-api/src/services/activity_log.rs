//! Best-effort activity feed entries.

use tracing::warn;

use rapport_core::{ActivityRepository, CreateActivityRequest};
use rapport_db::Database;

pub const NOTE_CREATED: &str = "note_created";
pub const TODO_COMPLETED: &str = "todo_completed";

/// Append an entry to an account's activity feed.
///
/// Failures are logged and swallowed; the triggering request already
/// succeeded.
pub async fn record_activity(
    db: &Database,
    account_id: &str,
    activity_type: &str,
    title: String,
    entity_type: &str,
    entity_id: &str,
) {
    let req = CreateActivityRequest {
        account_id: account_id.to_string(),
        activity_type: activity_type.to_string(),
        title,
        description: None,
        entity_type: Some(entity_type.to_string()),
        entity_id: Some(entity_id.to_string()),
    };
    if let Err(e) = db.activities.create(req).await {
        warn!(
            subsystem = "api",
            component = "activity_log",
            account_id = %account_id,
            activity_type,
            error = %e,
            "Failed to record activity"
        );
    }
}
