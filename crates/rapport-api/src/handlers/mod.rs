//! HTTP handlers, one module per resource.

pub mod accounts;
pub mod activities;
pub mod analytics;
pub mod attachments;
pub mod capture;
pub mod contacts;
pub mod data;
pub mod import;
pub mod notes;
pub mod search;
pub mod tags;
pub mod todos;

use axum::Json;
use serde::Serialize;

/// Body for mutations without a resource to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub(crate) fn message(text: &'static str) -> Json<MessageResponse> {
    Json(MessageResponse { message: text })
}

#[derive(Debug, Serialize)]
pub struct PinnedResponse {
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct ArchivedResponse {
    pub archived: bool,
}

/// Rows removed by a bulk delete.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

/// Rows touched by a bulk update.
#[derive(Debug, Serialize)]
pub struct AffectedResponse {
    pub affected: u64,
}
