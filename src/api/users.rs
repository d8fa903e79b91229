use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{db_error, not_found, ApiError, ApiResult};
use crate::models::{CreateUser, User};
use crate::services::UserService;

#[derive(Clone)]
pub struct UsersAppState {
    pub user_service: UserService,
}

pub fn user_routes(db: PgPool) -> Router {
    let shared_state = UsersAppState {
        user_service: UserService::new(db),
    };

    Router::new()
        .route("/users", axum::routing::post(create_user))
        .route("/users/:user_id", get(get_user))
        .with_state(shared_state)
}

pub async fn create_user(
    State(state): State<UsersAppState>,
    Json(request): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), (StatusCode, Json<ApiError>)> {
    let user = state
        .user_service
        .create_user(request)
        .await
        .map_err(|e| db_error("Failed to create user", e))?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<UsersAppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<User> {
    let user = state
        .user_service
        .get_user(user_id)
        .await
        .map_err(|e| db_error("Failed to retrieve user", e))?
        .ok_or_else(|| not_found("User"))?;

    Ok(Json(user))
}
