use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutTemplate {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateExercise {
    pub id: Uuid,
    pub template_id: Uuid,
    pub exercise_name: String,
    pub sequence_num: i32,
    pub rest_seconds: Option<i32>,
    pub min_reps: Option<i32>,
    pub max_reps: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateSet {
    pub id: Uuid,
    pub template_exercise_id: Uuid,
    pub sequence_num: i32,
    pub default_reps: Option<i32>,
    pub default_weight: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(nested)]
    pub exercises: Vec<CreateTemplateExercise>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateExercise {
    #[validate(length(min = 1, max = 100))]
    pub exercise_name: String,
    pub rest_seconds: Option<i32>,
    pub min_reps: Option<i32>,
    pub max_reps: Option<i32>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub sets: Vec<CreateTemplateSet>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateSet {
    pub default_reps: Option<i32>,
    pub default_weight: Option<f64>,
    pub notes: Option<String>,
}

/// A template with its exercises and sets fully loaded.
#[derive(Debug, Serialize)]
pub struct TemplateDetail {
    pub template: WorkoutTemplate,
    pub exercises: Vec<TemplateExerciseDetail>,
}

#[derive(Debug, Serialize)]
pub struct TemplateExerciseDetail {
    pub exercise: TemplateExercise,
    pub sets: Vec<TemplateSet>,
}
