use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{db_error, not_found, validation_error, ApiError, ApiResult};
use crate::models::{
    CompleteSessionRequest, CreateFeedbackRequest, ExerciseFeedback, SessionDetail, SessionStatus,
    SessionSummary, WorkoutFeedback, WorkoutSession,
};
use crate::services::{FeedbackError, FeedbackService, ProgressionService, SessionService};

#[derive(Clone)]
pub struct SessionsAppState {
    pub session_service: SessionService,
    pub feedback_service: FeedbackService,
    pub progression_service: ProgressionService,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub status: Option<SessionStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub fn session_routes(db: PgPool) -> Router {
    let shared_state = SessionsAppState {
        session_service: SessionService::new(db.clone()),
        feedback_service: FeedbackService::new(db.clone()),
        progression_service: ProgressionService::new(db),
    };

    Router::new()
        .route("/clients/:client_id/sessions", get(get_client_sessions))
        .route("/clients/:client_id/sessions/summary", get(get_summary))
        .route("/sessions/:session_id", get(get_session))
        .route("/sessions/:session_id/complete", post(complete_session))
        .route(
            "/sessions/:session_id/feedback",
            get(get_feedback).post(submit_feedback),
        )
        .route(
            "/coaches/:coach_id/feedback/unviewed",
            get(get_unviewed_feedback),
        )
        .route("/feedback/:feedback_id/sets", get(get_set_feedback))
        .route("/feedback/:feedback_id/viewed", post(mark_feedback_viewed))
        .with_state(shared_state)
}

pub async fn get_client_sessions(
    State(state): State<SessionsAppState>,
    Path(client_id): Path<Uuid>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Vec<WorkoutSession>> {
    let sessions = state
        .session_service
        .get_sessions_for_client(client_id, query.status, query.limit, query.offset)
        .await
        .map_err(|e| db_error("Failed to retrieve sessions", e))?;

    Ok(Json(sessions))
}

pub async fn get_summary(
    State(state): State<SessionsAppState>,
    Path(client_id): Path<Uuid>,
) -> ApiResult<SessionSummary> {
    let summary = state
        .session_service
        .get_summary(client_id)
        .await
        .map_err(|e| db_error("Failed to retrieve session summary", e))?;

    Ok(Json(summary))
}

pub async fn get_session(
    State(state): State<SessionsAppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<SessionDetail> {
    let detail = state
        .session_service
        .get_session_detail(session_id)
        .await
        .map_err(|e| db_error("Failed to retrieve session", e))?
        .ok_or_else(|| not_found("Session"))?;

    Ok(Json(detail))
}

/// Record set results and mark the session complete, then run any
/// progression rules that watch its exercises.
pub async fn complete_session(
    State(state): State<SessionsAppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CompleteSessionRequest>,
) -> ApiResult<WorkoutSession> {
    let session = state
        .session_service
        .complete_session(session_id, request)
        .await
        .map_err(|e| db_error("Failed to complete session", e))?
        .ok_or_else(|| {
            (
                StatusCode::CONFLICT,
                Json(ApiError::new(
                    "ALREADY_COMPLETED",
                    "Session not found or already completed",
                )),
            )
        })?;

    if let Err(e) = state.progression_service.evaluate_session(session_id).await {
        tracing::error!(%session_id, error = %e, "progression evaluation failed");
    }

    Ok(Json(session))
}

/// Feedback marks the session complete when the client skipped the explicit
/// completion step.
pub async fn submit_feedback(
    State(state): State<SessionsAppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<WorkoutFeedback>), (StatusCode, Json<ApiError>)> {
    request.validate().map_err(validation_error)?;

    let session = state
        .session_service
        .get_session(session_id)
        .await
        .map_err(|e| db_error("Failed to retrieve session", e))?
        .ok_or_else(|| not_found("Session"))?;

    let feedback = state
        .feedback_service
        .submit_feedback(session_id, session.client_id, request)
        .await
        .map_err(|e| match e.downcast_ref::<FeedbackError>() {
            Some(FeedbackError::AlreadySubmitted) => (
                StatusCode::CONFLICT,
                Json(ApiError::new(
                    "FEEDBACK_EXISTS",
                    "Feedback was already submitted for this session",
                )),
            ),
            None => db_error("Failed to submit feedback", e),
        })?;

    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn get_feedback(
    State(state): State<SessionsAppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<WorkoutFeedback> {
    let feedback = state
        .feedback_service
        .get_for_session(session_id)
        .await
        .map_err(|e| db_error("Failed to retrieve feedback", e))?
        .ok_or_else(|| not_found("Feedback"))?;

    Ok(Json(feedback))
}

/// Feedback a coach has not yet reviewed, across all their schedules.
pub async fn get_unviewed_feedback(
    State(state): State<SessionsAppState>,
    Path(coach_id): Path<Uuid>,
) -> ApiResult<Vec<WorkoutFeedback>> {
    let feedback = state
        .feedback_service
        .get_unviewed_for_coach(coach_id)
        .await
        .map_err(|e| db_error("Failed to retrieve feedback", e))?;

    Ok(Json(feedback))
}

pub async fn get_set_feedback(
    State(state): State<SessionsAppState>,
    Path(feedback_id): Path<Uuid>,
) -> ApiResult<Vec<ExerciseFeedback>> {
    let entries = state
        .feedback_service
        .get_exercise_feedback(feedback_id)
        .await
        .map_err(|e| db_error("Failed to retrieve set feedback", e))?;

    Ok(Json(entries))
}

pub async fn mark_feedback_viewed(
    State(state): State<SessionsAppState>,
    Path(feedback_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let updated = state
        .feedback_service
        .mark_coach_viewed(feedback_id)
        .await
        .map_err(|e| db_error("Failed to update feedback", e))?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Feedback"))
    }
}
