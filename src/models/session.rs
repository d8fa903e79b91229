use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Missed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub status: SessionStatus,
    pub template_id: Option<Uuid>,
    pub assignment_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub is_from_coach: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutExercise {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Backlink to the template exercise this was copied from; progression
    /// rules resolve through it.
    pub template_exercise_id: Option<Uuid>,
    pub exercise_name: String,
    pub sequence_num: i32,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutSet {
    pub id: Uuid,
    pub workout_exercise_id: Uuid,
    pub set_number: i32,
    pub sequence_num: i32,
    pub reps: Option<i32>,
    pub target_min_reps: Option<i32>,
    pub target_max_reps: Option<i32>,
    pub weight: Option<f64>,
    pub rpe: Option<i32>,
    pub rest_seconds: Option<i32>,
    pub is_completed: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteSessionRequest {
    pub end_datetime: Option<DateTime<Utc>>,
    pub completed_sets: Option<Vec<CompletedSet>>,
}

#[derive(Debug, Deserialize)]
pub struct CompletedSet {
    pub set_id: Uuid,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub is_completed: bool,
}

/// A session with its exercise/set hierarchy fully loaded.
#[derive(Debug, Serialize)]
pub struct SessionDetail {
    pub session: WorkoutSession,
    pub exercises: Vec<SessionExerciseDetail>,
}

#[derive(Debug, Serialize)]
pub struct SessionExerciseDetail {
    pub exercise: WorkoutExercise,
    pub sets: Vec<WorkoutSet>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub missed_sessions: i64,
    pub total_duration_minutes: Option<i64>,
}
