use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{db_error, forbidden, not_found, validation_error, ApiError, ApiResult};
use crate::models::{AssignmentResponse, Capability, CreateAssignmentRequest, TemplateAssignment};
use crate::services::schedule_service::validate_schedule_request;
use crate::services::{AssignmentService, RelationshipService};

#[derive(Clone)]
pub struct AssignmentsAppState {
    pub assignment_service: AssignmentService,
    pub relationship_service: RelationshipService,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub fn assignment_routes(db: PgPool) -> Router {
    let shared_state = AssignmentsAppState {
        assignment_service: AssignmentService::new(db.clone()),
        relationship_service: RelationshipService::new(db),
    };

    Router::new()
        .route(
            "/coaches/:coach_id/assignments",
            get(get_coach_assignments).post(create_assignment),
        )
        .route("/clients/:client_id/assignments", get(get_client_assignments))
        .route(
            "/assignments/:assignment_id",
            get(get_assignment).delete(delete_assignment),
        )
        .route("/assignments/:assignment_id/active", put(set_active))
        .with_state(shared_state)
}

/// Assign a template to a client, optionally creating its workout schedule
/// in the same transaction. Requires the assign-templates capability.
pub async fn create_assignment(
    State(state): State<AssignmentsAppState>,
    Path(coach_id): Path<Uuid>,
    Json(request): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>), (StatusCode, Json<ApiError>)> {
    request.validate().map_err(validation_error)?;

    if let Some(schedule) = &request.schedule {
        validate_schedule_request(schedule).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new("INVALID_SCHEDULE", &e.to_string())),
            )
        })?;
    }

    let allowed = state
        .relationship_service
        .has_capability(coach_id, request.client_id, Capability::AssignTemplates)
        .await
        .map_err(|e| db_error("Failed to check permissions", e))?;
    if !allowed {
        return Err(forbidden("Coach may not assign templates to this client"));
    }

    let relationship = state
        .relationship_service
        .active_relationship(coach_id, request.client_id)
        .await
        .map_err(|e| db_error("Failed to load relationship", e))?;

    let (assignment, schedule) = state
        .assignment_service
        .create_assignment(coach_id, relationship.map(|r| r.id), request)
        .await
        .map_err(|e| db_error("Failed to create assignment", e))?;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse {
            assignment,
            schedule_id: schedule.map(|s| s.id),
            success: true,
        }),
    ))
}

pub async fn get_coach_assignments(
    State(state): State<AssignmentsAppState>,
    Path(coach_id): Path<Uuid>,
) -> ApiResult<Vec<TemplateAssignment>> {
    let assignments = state
        .assignment_service
        .get_assignments_for_coach(coach_id)
        .await
        .map_err(|e| db_error("Failed to retrieve assignments", e))?;

    Ok(Json(assignments))
}

pub async fn get_client_assignments(
    State(state): State<AssignmentsAppState>,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Vec<TemplateAssignment>> {
    let assignments = state
        .assignment_service
        .get_assignments_for_client(client_id)
        .await
        .map_err(|e| db_error("Failed to retrieve assignments", e))?;

    Ok(Json(assignments))
}

pub async fn get_assignment(
    State(state): State<AssignmentsAppState>,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult<TemplateAssignment> {
    let assignment = state
        .assignment_service
        .get_assignment(assignment_id)
        .await
        .map_err(|e| db_error("Failed to retrieve assignment", e))?
        .ok_or_else(|| not_found("Assignment"))?;

    Ok(Json(assignment))
}

/// Pausing an assignment also pauses its schedules.
pub async fn set_active(
    State(state): State<AssignmentsAppState>,
    Path(assignment_id): Path<Uuid>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResult<TemplateAssignment> {
    let assignment = state
        .assignment_service
        .set_active(assignment_id, request.is_active)
        .await
        .map_err(|e| db_error("Failed to update assignment", e))?
        .ok_or_else(|| not_found("Assignment"))?;

    Ok(Json(assignment))
}

pub async fn delete_assignment(
    State(state): State<AssignmentsAppState>,
    Path(assignment_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let deleted = state
        .assignment_service
        .delete_assignment(assignment_id)
        .await
        .map_err(|e| db_error("Failed to delete assignment", e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Assignment"))
    }
}
