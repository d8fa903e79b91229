use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutFeedback {
    pub id: Uuid,
    pub session_id: Uuid,
    pub client_id: Uuid,
    pub overall_rating: i32,
    pub difficulty_rating: i32,
    pub energy_level: i32,
    pub comments: Option<String>,
    pub completed_all_exercises: bool,
    pub incomplete_reason: Option<String>,
    pub coach_viewed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseFeedback {
    pub id: Uuid,
    pub feedback_id: Uuid,
    pub workout_set_id: Uuid,
    pub rpe: i32,
    pub difficulty: i32,
    pub too_heavy: bool,
    pub too_light: bool,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    #[validate(range(min = 1, max = 10))]
    pub overall_rating: i32,
    #[validate(range(min = 1, max = 10))]
    pub difficulty_rating: i32,
    #[validate(range(min = 1, max = 10))]
    pub energy_level: i32,
    #[validate(length(max = 1000))]
    pub comments: Option<String>,
    pub completed_all_exercises: Option<bool>,
    #[validate(length(max = 1000))]
    pub incomplete_reason: Option<String>,
    #[validate(nested)]
    pub exercise_feedback: Vec<CreateExerciseFeedback>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExerciseFeedback {
    pub workout_set_id: Uuid,
    #[validate(range(min = 1, max = 10))]
    pub rpe: i32,
    #[validate(range(min = 1, max = 10))]
    pub difficulty: i32,
    pub too_heavy: Option<bool>,
    pub too_light: Option<bool>,
    #[validate(length(max = 500))]
    pub comments: Option<String>,
}
