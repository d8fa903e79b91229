use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::engine::progression::RuleParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RuleType {
    /// Increment by a percentage of the current value.
    Percentage,
    /// Increment by a fixed amount.
    Absolute,
    /// Success gated on reported RPE instead of completion rate.
    Rpe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RuleParameter {
    Weight,
    Reps,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgressionRule {
    pub id: Uuid,
    pub template_exercise_id: Uuid,
    pub client_id: Option<Uuid>,
    pub coach_id: Uuid,
    pub name: String,
    pub rule_type: RuleType,
    pub parameter: RuleParameter,
    pub increment_value: f64,
    pub consecutive_successes_required: i32,
    pub success_threshold: f64,
    pub maximum_value: Option<f64>,
    pub apply_deload: bool,
    pub deload_percentage: f64,
    pub consecutive_failures_for_deload: i32,
    pub success_streak: i32,
    pub failure_streak: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressionRule {
    pub fn params(&self) -> RuleParams {
        RuleParams {
            rule_type: self.rule_type,
            increment_value: self.increment_value,
            consecutive_successes_required: self.consecutive_successes_required,
            success_threshold: self.success_threshold,
            maximum_value: self.maximum_value,
            apply_deload: self.apply_deload,
            deload_percentage: self.deload_percentage,
            consecutive_failures_for_deload: self.consecutive_failures_for_deload,
        }
    }
}

/// Append-only audit log of applied progression actions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgressionHistory {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub session_id: Option<Uuid>,
    pub action: String,
    pub previous_value: f64,
    pub new_value: f64,
    pub reason: Option<String>,
    pub applied_automatically: bool,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRuleRequest {
    pub template_exercise_id: Uuid,
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub rule_type: RuleType,
    pub parameter: RuleParameter,
    pub increment_value: f64,
    #[validate(range(min = 1, max = 10))]
    pub consecutive_successes_required: Option<i32>,
    pub success_threshold: f64,
    pub maximum_value: Option<f64>,
    pub apply_deload: Option<bool>,
    #[validate(range(min = 1.0, max = 50.0))]
    pub deload_percentage: Option<f64>,
    #[validate(range(min = 1, max = 10))]
    pub consecutive_failures_for_deload: Option<i32>,
}
