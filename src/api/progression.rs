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
use validator::Validate;

use super::{db_error, not_found, validation_error, ApiError, ApiResult};
use crate::models::{CreateRuleRequest, ProgressionHistory, ProgressionRule};
use crate::services::ProgressionService;

#[derive(Clone)]
pub struct ProgressionAppState {
    pub progression_service: ProgressionService,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

pub fn progression_routes(db: PgPool) -> Router {
    let shared_state = ProgressionAppState {
        progression_service: ProgressionService::new(db),
    };

    Router::new()
        .route(
            "/coaches/:coach_id/progression-rules",
            get(get_rules).post(create_rule),
        )
        .route("/progression-rules/:rule_id/active", put(set_active))
        .route("/progression-rules/:rule_id/history", get(get_history))
        .with_state(shared_state)
}

pub async fn create_rule(
    State(state): State<ProgressionAppState>,
    Path(coach_id): Path<Uuid>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<ProgressionRule>), (StatusCode, Json<ApiError>)> {
    request.validate().map_err(validation_error)?;

    let rule = state
        .progression_service
        .create_rule(coach_id, request)
        .await
        .map_err(|e| db_error("Failed to create progression rule", e))?;

    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn get_rules(
    State(state): State<ProgressionAppState>,
    Path(coach_id): Path<Uuid>,
) -> ApiResult<Vec<ProgressionRule>> {
    let rules = state
        .progression_service
        .get_rules_for_coach(coach_id)
        .await
        .map_err(|e| db_error("Failed to retrieve progression rules", e))?;

    Ok(Json(rules))
}

pub async fn set_active(
    State(state): State<ProgressionAppState>,
    Path(rule_id): Path<Uuid>,
    Json(request): Json<SetActiveRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let updated = state
        .progression_service
        .set_rule_active(rule_id, request.is_active)
        .await
        .map_err(|e| db_error("Failed to update progression rule", e))?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Progression rule"))
    }
}

pub async fn get_history(
    State(state): State<ProgressionAppState>,
    Path(rule_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<ProgressionHistory>> {
    let history = state
        .progression_service
        .get_history(rule_id, query.limit)
        .await
        .map_err(|e| db_error("Failed to retrieve progression history", e))?;

    Ok(Json(history))
}
