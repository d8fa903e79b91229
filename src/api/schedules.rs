use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{db_error, forbidden, not_found, validation_error, ApiError, ApiResult};
use crate::engine::recurrence::upcoming_occurrences;
use crate::models::{
    Capability, CreateScheduleRequest, UpdateScheduleRequest, WorkoutSchedule,
};
use crate::services::schedule_service::validate_schedule_request;
use crate::services::{
    ProcessorOptions, RelationshipService, ScheduleProcessor, ScheduleService,
};

#[derive(Clone)]
pub struct SchedulesAppState {
    pub schedule_service: ScheduleService,
    pub relationship_service: RelationshipService,
    pub processor: ScheduleProcessor,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct OccurrencesQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OccurrencesResponse {
    pub schedule_id: Uuid,
    pub occurrences: Vec<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ProcessRunResponse {
    pub sessions_created: u32,
}

pub fn schedule_routes(db: PgPool, options: ProcessorOptions) -> Router {
    let shared_state = SchedulesAppState {
        schedule_service: ScheduleService::new(db.clone()),
        relationship_service: RelationshipService::new(db.clone()),
        processor: ScheduleProcessor::new(db, options),
    };

    Router::new()
        .route(
            "/coaches/:coach_id/clients/:client_id/schedules",
            post(create_schedule),
        )
        .route("/clients/:client_id/schedules", get(get_client_schedules))
        .route(
            "/schedules/:schedule_id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route("/schedules/:schedule_id/active", put(set_active))
        .route("/schedules/:schedule_id/occurrences", get(get_occurrences))
        .route("/schedules/process", post(run_processor))
        .with_state(shared_state)
}

/// Create a schedule for a client. A coach scheduling for someone else needs
/// the create-workouts capability; clients may schedule for themselves.
pub async fn create_schedule(
    State(state): State<SchedulesAppState>,
    Path((coach_id, client_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<WorkoutSchedule>), (StatusCode, Json<ApiError>)> {
    request.validate().map_err(validation_error)?;
    validate_schedule_request(&request).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("INVALID_SCHEDULE", &e.to_string())),
        )
    })?;

    if coach_id != client_id {
        let allowed = state
            .relationship_service
            .has_capability(coach_id, client_id, Capability::CreateWorkouts)
            .await
            .map_err(|e| db_error("Failed to check permissions", e))?;
        if !allowed {
            return Err(forbidden("Coach may not create workouts for this client"));
        }
    }

    let schedule = state
        .schedule_service
        .create_schedule(client_id, coach_id, request)
        .await
        .map_err(|e| db_error("Failed to create schedule", e))?;

    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn get_client_schedules(
    State(state): State<SchedulesAppState>,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Vec<WorkoutSchedule>> {
    let schedules = state
        .schedule_service
        .get_schedules_for_client(client_id)
        .await
        .map_err(|e| db_error("Failed to retrieve schedules", e))?;

    Ok(Json(schedules))
}

pub async fn get_schedule(
    State(state): State<SchedulesAppState>,
    Path(schedule_id): Path<Uuid>,
) -> ApiResult<WorkoutSchedule> {
    let schedule = state
        .schedule_service
        .get_schedule(schedule_id)
        .await
        .map_err(|e| db_error("Failed to retrieve schedule", e))?
        .ok_or_else(|| not_found("Schedule"))?;

    Ok(Json(schedule))
}

pub async fn update_schedule(
    State(state): State<SchedulesAppState>,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> ApiResult<WorkoutSchedule> {
    request.validate().map_err(validation_error)?;

    let schedule = state
        .schedule_service
        .update_schedule(schedule_id, request)
        .await
        .map_err(|e| db_error("Failed to update schedule", e))?
        .ok_or_else(|| not_found("Schedule"))?;

    Ok(Json(schedule))
}

pub async fn set_active(
    State(state): State<SchedulesAppState>,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResult<WorkoutSchedule> {
    let schedule = state
        .schedule_service
        .set_active(schedule_id, request.is_active)
        .await
        .map_err(|e| db_error("Failed to update schedule", e))?
        .ok_or_else(|| not_found("Schedule"))?;

    Ok(Json(schedule))
}

pub async fn delete_schedule(
    State(state): State<SchedulesAppState>,
    Path(schedule_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let deleted = state
        .schedule_service
        .delete_schedule(schedule_id)
        .await
        .map_err(|e| db_error("Failed to delete schedule", e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Schedule"))
    }
}

/// Preview the next few occurrences of a recurring schedule.
pub async fn get_occurrences(
    State(state): State<SchedulesAppState>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<OccurrencesQuery>,
) -> ApiResult<OccurrencesResponse> {
    let schedule = state
        .schedule_service
        .get_schedule(schedule_id)
        .await
        .map_err(|e| db_error("Failed to retrieve schedule", e))?
        .ok_or_else(|| not_found("Schedule"))?;

    let count = query.count.unwrap_or(5).min(50);
    let occurrences = upcoming_occurrences(
        &schedule.recurrence_spec(),
        Utc::now().naive_utc(),
        count,
    )
    .into_iter()
    .map(|occurrence| occurrence.and_utc())
    .collect();

    Ok(Json(OccurrencesResponse {
        schedule_id,
        occurrences,
    }))
}

/// Manually run the due-window scan, outside the cron cadence.
pub async fn run_processor(
    State(state): State<SchedulesAppState>,
) -> ApiResult<ProcessRunResponse> {
    let sessions_created = state
        .processor
        .process_due()
        .await
        .map_err(|e| db_error("Failed to process schedules", e))?;

    Ok(Json(ProcessRunResponse { sessions_created }))
}
