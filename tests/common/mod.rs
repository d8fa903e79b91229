// Shared builders for test data

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use workout_tracker::models::*;

pub struct MockData;

impl MockData {
    pub fn schedule(client_id: Uuid, coach_id: Uuid) -> WorkoutSchedule {
        WorkoutSchedule {
            id: Uuid::new_v4(),
            assignment_id: None,
            template_id: Some(Uuid::new_v4()),
            client_id,
            coach_id,
            name: "Push day".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: None,
            scheduled_datetime: None,
            is_recurring: true,
            recurrence_pattern: RecurrencePattern::Weekly,
            recurrence_day_of_week: None,
            recurrence_day_of_month: None,
            multiple_days_of_week: None,
            send_reminder: true,
            reminder_hours_before: 24,
            last_reminder_sent: None,
            is_active: true,
            last_generated_workout_date: None,
            total_workouts_generated: 0,
            last_generation_status: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn rule(coach_id: Uuid) -> ProgressionRule {
        ProgressionRule {
            id: Uuid::new_v4(),
            template_exercise_id: Uuid::new_v4(),
            client_id: None,
            coach_id,
            name: "Bench linear progression".to_string(),
            rule_type: RuleType::Absolute,
            parameter: RuleParameter::Weight,
            increment_value: 2.5,
            consecutive_successes_required: 2,
            success_threshold: 90.0,
            maximum_value: None,
            apply_deload: true,
            deload_percentage: 10.0,
            consecutive_failures_for_deload: 3,
            success_streak: 0,
            failure_streak: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
