use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use super::{db_error, not_found, validation_error, ApiError, ApiResult};
use crate::models::{
    CoachClientPermission, CoachClientRelationship, CreateRelationshipRequest,
    UpdatePermissionsRequest, UpdateRelationshipStatusRequest,
};
use crate::services::RelationshipService;

#[derive(Clone)]
pub struct ClientsAppState {
    pub relationship_service: RelationshipService,
}

pub fn client_routes(db: PgPool) -> Router {
    let shared_state = ClientsAppState {
        relationship_service: RelationshipService::new(db),
    };

    Router::new()
        .route(
            "/coaches/:coach_id/relationships",
            get(get_relationships).post(create_relationship),
        )
        .route("/relationships/:relationship_id", get(get_relationship))
        .route("/relationships/:relationship_id/status", put(update_status))
        .route(
            "/relationships/:relationship_id/permissions",
            get(get_permissions).put(update_permissions),
        )
        .with_state(shared_state)
}

/// Invite a client into a coaching relationship (starts pending).
pub async fn create_relationship(
    State(state): State<ClientsAppState>,
    Path(coach_id): Path<Uuid>,
    Json(request): Json<CreateRelationshipRequest>,
) -> Result<(StatusCode, Json<CoachClientRelationship>), (StatusCode, Json<ApiError>)> {
    request.validate().map_err(validation_error)?;

    let relationship = state
        .relationship_service
        .create_relationship(coach_id, request)
        .await
        .map_err(|e| db_error("Failed to create relationship", e))?;

    Ok((StatusCode::CREATED, Json(relationship)))
}

pub async fn get_relationships(
    State(state): State<ClientsAppState>,
    Path(coach_id): Path<Uuid>,
) -> ApiResult<Vec<CoachClientRelationship>> {
    let relationships = state
        .relationship_service
        .get_clients_for_coach(coach_id)
        .await
        .map_err(|e| db_error("Failed to retrieve relationships", e))?;

    Ok(Json(relationships))
}

pub async fn get_relationship(
    State(state): State<ClientsAppState>,
    Path(relationship_id): Path<Uuid>,
) -> ApiResult<CoachClientRelationship> {
    let relationship = state
        .relationship_service
        .get_relationship(relationship_id)
        .await
        .map_err(|e| db_error("Failed to retrieve relationship", e))?
        .ok_or_else(|| not_found("Relationship"))?;

    Ok(Json(relationship))
}

pub async fn update_status(
    State(state): State<ClientsAppState>,
    Path(relationship_id): Path<Uuid>,
    Json(request): Json<UpdateRelationshipStatusRequest>,
) -> ApiResult<CoachClientRelationship> {
    let relationship = state
        .relationship_service
        .update_status(relationship_id, request.status)
        .await
        .map_err(|e| db_error("Failed to update relationship status", e))?
        .ok_or_else(|| not_found("Relationship"))?;

    Ok(Json(relationship))
}

pub async fn get_permissions(
    State(state): State<ClientsAppState>,
    Path(relationship_id): Path<Uuid>,
) -> ApiResult<CoachClientPermission> {
    let permissions = state
        .relationship_service
        .get_permissions(relationship_id)
        .await
        .map_err(|e| db_error("Failed to retrieve permissions", e))?
        .ok_or_else(|| not_found("Permissions"))?;

    Ok(Json(permissions))
}

pub async fn update_permissions(
    State(state): State<ClientsAppState>,
    Path(relationship_id): Path<Uuid>,
    Json(request): Json<UpdatePermissionsRequest>,
) -> ApiResult<CoachClientPermission> {
    let permissions = state
        .relationship_service
        .update_permissions(relationship_id, request)
        .await
        .map_err(|e| db_error("Failed to update permissions", e))?
        .ok_or_else(|| not_found("Permissions"))?;

    Ok(Json(permissions))
}
