// API routes and handlers

pub mod assignments;
pub mod clients;
pub mod health;
pub mod notifications;
pub mod progression;
pub mod routes;
pub mod schedules;
pub mod sessions;
pub mod templates;
pub mod users;

use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error_code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error_code: code.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub(crate) fn db_error(context: &str, e: anyhow::Error) -> (StatusCode, Json<ApiError>) {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new("DATABASE_ERROR", context)),
    )
}

pub(crate) fn not_found(resource: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new("NOT_FOUND", &format!("{resource} not found"))),
    )
}

pub(crate) fn forbidden(message: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::FORBIDDEN,
        Json(ApiError::new("PERMISSION_DENIED", message)),
    )
}

pub(crate) fn validation_error(e: validator::ValidationErrors) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new("VALIDATION_ERROR", &e.to_string())),
    )
}
