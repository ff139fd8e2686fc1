//! Dashboard analytics and JSON export.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use rapport_core::{Analytics, IncompleteNote};

use crate::{ApiError, AppState};

pub async fn get_analytics(State(state): State<AppState>) -> Result<Json<Analytics>, ApiError> {
    Ok(Json(state.db.analytics.summary().await?))
}

/// Notes whose note or account fields are still empty.
pub async fn incomplete_notes(
    State(state): State<AppState>,
) -> Result<Json<Vec<IncompleteNote>>, ApiError> {
    Ok(Json(state.db.analytics.incomplete_notes().await?))
}

/// Download every active account, note, todo, tag and contact as JSON.
pub async fn export_data(State(state): State<AppState>) -> Result<Response, ApiError> {
    let export = state.db.export.export().await?;
    let filename = format!(
        "attachment; filename=\"rapport-export-{}.json\"",
        export.exported_at.format("%Y%m%d-%H%M%S")
    );
    let mut response = Json(export).into_response();
    if let Ok(value) = HeaderValue::from_str(&filename) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}
