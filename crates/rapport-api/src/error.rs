//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Error returned by every handler. Serialized as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    Database(rapport_core::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<rapport_core::Error> for ApiError {
    fn from(err: rapport_core::Error) -> Self {
        match &err {
            rapport_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            rapport_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            rapport_core::Error::Conflict(msg) => ApiError::Conflict(msg.clone()),
            rapport_core::Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if err.is_unique_violation() {
                    let friendly_msg = if msg.contains("uq_contacts_email") {
                        "Contact already exists".to_string()
                    } else if msg.contains("uq_tags_name") {
                        "A tag with this name already exists".to_string()
                    } else {
                        msg
                    };
                    return ApiError::Conflict(friendly_msg);
                }
                if msg.contains("foreign key") {
                    return ApiError::BadRequest(msg);
                }
                ApiError::Database(err)
            }
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                tracing::error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
