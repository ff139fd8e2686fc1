//! Account HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use rapport_core::{Account, AccountRepository, CreateAccountRequest, UpdateAccountRequest};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateAccountBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_owner: String,
    pub budget: Option<f64>,
    pub est_engineers: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountBody {
    pub name: Option<String>,
    pub account_owner: Option<String>,
    pub budget: Option<f64>,
    pub est_engineers: Option<i32>,
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.db.accounts.list().await?))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(state.db.accounts.get(&id).await?))
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(body): Json<CreateAccountBody>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = state
        .db
        .accounts
        .create(CreateAccountRequest {
            name: body.name,
            account_owner: body.account_owner,
            budget: body.budget,
            est_engineers: body.est_engineers,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Partial update. Returns the updated account.
///
/// # Returns
/// - 200 OK with the account
/// - 400 Bad Request if the body names no field or blanks the name
/// - 404 Not Found if the account doesn't exist
pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateAccountBody>,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .db
        .accounts
        .update(
            &id,
            UpdateAccountRequest {
                name: body.name,
                account_owner: body.account_owner,
                budget: body.budget,
                est_engineers: body.est_engineers,
            },
        )
        .await?;
    Ok(Json(account))
}

/// Delete an account with its notes and activities.
pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.accounts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
