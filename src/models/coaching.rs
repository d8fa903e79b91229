use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Pending,
    Active,
    Paused,
    Ended,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoachClientRelationship {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub client_id: Uuid,
    pub status: RelationshipStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Capability flags gating what a coach may do with a client's data.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoachClientPermission {
    pub id: Uuid,
    pub relationship_id: Uuid,
    pub can_view_workouts: bool,
    pub can_create_workouts: bool,
    pub can_modify_workouts: bool,
    pub can_delete_workouts: bool,
    pub can_view_reports: bool,
    pub can_assign_templates: bool,
    pub can_message: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewWorkouts,
    CreateWorkouts,
    ModifyWorkouts,
    DeleteWorkouts,
    ViewReports,
    AssignTemplates,
    Message,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewWorkouts => "view_workouts",
            Capability::CreateWorkouts => "create_workouts",
            Capability::ModifyWorkouts => "modify_workouts",
            Capability::DeleteWorkouts => "delete_workouts",
            Capability::ViewReports => "view_reports",
            Capability::AssignTemplates => "assign_templates",
            Capability::Message => "message",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRelationshipRequest {
    pub client_id: Uuid,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRelationshipStatusRequest {
    pub status: RelationshipStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    pub can_view_workouts: Option<bool>,
    pub can_create_workouts: Option<bool>,
    pub can_modify_workouts: Option<bool>,
    pub can_delete_workouts: Option<bool>,
    pub can_view_reports: Option<bool>,
    pub can_assign_templates: Option<bool>,
    pub can_message: Option<bool>,
}
