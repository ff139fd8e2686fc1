//! Account activity feed handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use rapport_core::defaults::ACTIVITY_LIMIT;
use rapport_core::{Activity, ActivityRepository, CreateActivityRequest};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityBody {
    #[serde(default)]
    pub account_id: String,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
}

pub async fn list_activities(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(ACTIVITY_LIMIT);
    let activities = state
        .db
        .activities
        .list_for_account(&account_id, limit)
        .await?;
    Ok(Json(activities))
}

pub async fn create_activity(
    State(state): State<AppState>,
    Json(body): Json<CreateActivityBody>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    let activity = state
        .db
        .activities
        .create(CreateActivityRequest {
            account_id: body.account_id,
            activity_type: body.activity_type,
            title: body.title,
            description: body.description,
            entity_type: body.entity_type,
            entity_id: body.entity_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}
