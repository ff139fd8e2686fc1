//! Whole-dataset maintenance.

use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::handlers::{message, MessageResponse};
use crate::{ApiError, AppState};

/// Delete all accounts, notes, todos, tags, contacts and activities, then
/// empty the uploads directory.
///
/// Rows go in a single transaction. A failure while removing files is
/// logged and does not undo the cleared rows.
pub async fn clear_all(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    state.db.clear_all_data().await?;

    if let Some(attachments) = state.db.attachments.as_ref() {
        match attachments.clear_files().await {
            Ok(removed) => info!(removed, "Uploads directory emptied"),
            Err(e) => warn!(error = %e, "Failed to empty uploads directory"),
        }
    }

    Ok(message("All data cleared successfully"))
}
