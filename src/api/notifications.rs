use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{db_error, not_found, ApiError, ApiResult};
use crate::models::Notification;
use crate::services::NotificationService;

#[derive(Clone)]
pub struct NotificationsAppState {
    pub notification_service: NotificationService,
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

pub fn notification_routes(db: PgPool) -> Router {
    let shared_state = NotificationsAppState {
        notification_service: NotificationService::new(db),
    };

    Router::new()
        .route("/users/:user_id/notifications", get(get_notifications))
        .route(
            "/users/:user_id/notifications/:notification_id/read",
            put(mark_read),
        )
        .with_state(shared_state)
}

pub async fn get_notifications(
    State(state): State<NotificationsAppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Vec<Notification>> {
    let notifications = state
        .notification_service
        .get_for_user(user_id, query.unread_only.unwrap_or(false), query.limit)
        .await
        .map_err(|e| db_error("Failed to retrieve notifications", e))?;

    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<NotificationsAppState>,
    Path((user_id, notification_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let updated = state
        .notification_service
        .mark_read(notification_id, user_id)
        .await
        .map_err(|e| db_error("Failed to mark notification read", e))?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Notification"))
    }
}
