use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{db_error, not_found, validation_error, ApiError, ApiResult};
use crate::models::{CreateTemplateRequest, TemplateDetail, WorkoutTemplate};
use crate::services::TemplateService;

#[derive(Clone)]
pub struct TemplatesAppState {
    pub template_service: TemplateService,
}

pub fn template_routes(db: PgPool) -> Router {
    let shared_state = TemplatesAppState {
        template_service: TemplateService::new(db),
    };

    Router::new()
        .route(
            "/coaches/:coach_id/templates",
            get(get_templates).post(create_template),
        )
        .route("/templates/:template_id", get(get_template))
        .route(
            "/coaches/:coach_id/templates/:template_id",
            axum::routing::delete(delete_template),
        )
        .with_state(shared_state)
}

/// Create a template with its full exercise/set hierarchy.
pub async fn create_template(
    State(state): State<TemplatesAppState>,
    Path(coach_id): Path<Uuid>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateDetail>), (StatusCode, Json<ApiError>)> {
    request.validate().map_err(validation_error)?;

    let detail = state
        .template_service
        .create_template(coach_id, request)
        .await
        .map_err(|e| db_error("Failed to create template", e))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn get_templates(
    State(state): State<TemplatesAppState>,
    Path(coach_id): Path<Uuid>,
) -> ApiResult<Vec<WorkoutTemplate>> {
    let templates = state
        .template_service
        .get_templates_by_coach(coach_id)
        .await
        .map_err(|e| db_error("Failed to retrieve templates", e))?;

    Ok(Json(templates))
}

pub async fn get_template(
    State(state): State<TemplatesAppState>,
    Path(template_id): Path<Uuid>,
) -> ApiResult<TemplateDetail> {
    let detail = state
        .template_service
        .get_template_detail(template_id)
        .await
        .map_err(|e| db_error("Failed to retrieve template", e))?
        .ok_or_else(|| not_found("Template"))?;

    Ok(Json(detail))
}

pub async fn delete_template(
    State(state): State<TemplatesAppState>,
    Path((coach_id, template_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let deleted = state
        .template_service
        .delete_template(template_id, coach_id)
        .await
        .map_err(|e| db_error("Failed to delete template", e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Template"))
    }
}
