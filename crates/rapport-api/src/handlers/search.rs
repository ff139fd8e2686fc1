//! Unified search handler.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use rapport_core::SearchResult;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Search notes, accounts and todos.
///
/// # Query Parameters
/// - `q`: search text (required)
///
/// # Returns
/// - 200 OK with results: full-text note hits, participant note hits,
///   accounts, then todos
/// - 400 Bad Request if `q` is missing or blank
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let q = query.q.unwrap_or_default();
    let results = state.search.search(&q).await?;
    Ok(Json(results))
}
