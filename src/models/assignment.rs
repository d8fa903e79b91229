use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::schedule::CreateScheduleRequest;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateAssignment {
    pub id: Uuid,
    pub template_id: Uuid,
    pub client_id: Uuid,
    pub coach_id: Uuid,
    pub relationship_id: Option<Uuid>,
    pub name: String,
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub client_notified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    pub template_id: Uuid,
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// When present, a workout schedule is created in the same transaction.
    #[validate(nested)]
    pub schedule: Option<CreateScheduleRequest>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub assignment: TemplateAssignment,
    pub schedule_id: Option<Uuid>,
    pub success: bool,
}
