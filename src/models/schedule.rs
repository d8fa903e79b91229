use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::engine::recurrence::RecurrenceSpec;

/// Fallback time of day for recurring schedules created without an explicit
/// scheduled time (5 PM, matching the product default).
pub const DEFAULT_TIME_OF_DAY: (u32, u32) = (17, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Once,
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutSchedule {
    pub id: Uuid,
    pub assignment_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub client_id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub scheduled_datetime: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurrence_pattern: RecurrencePattern,
    pub recurrence_day_of_week: Option<i32>,
    pub recurrence_day_of_month: Option<i32>,
    pub multiple_days_of_week: Option<String>,
    pub send_reminder: bool,
    pub reminder_hours_before: i32,
    pub last_reminder_sent: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub last_generated_workout_date: Option<DateTime<Utc>>,
    pub total_workouts_generated: i32,
    pub last_generation_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutSchedule {
    /// Collects the weekday set from the primary day-of-week column plus the
    /// comma-separated `multiple_days_of_week` column ("1,3,5", 0 = Sunday).
    /// Invalid entries are skipped; an empty result for weekly patterns falls
    /// back to the start date's weekday.
    pub fn days_of_week(&self) -> Vec<Weekday> {
        let mut days: Vec<Weekday> = Vec::new();

        if let Some(primary) = self.recurrence_day_of_week {
            match weekday_from_sunday_index(primary) {
                Some(day) => days.push(day),
                None => tracing::warn!(
                    schedule_id = %self.id,
                    value = primary,
                    "schedule has out-of-range recurrence_day_of_week"
                ),
            }
        }

        if let Some(extra) = &self.multiple_days_of_week {
            for entry in extra.split(',').filter(|s| !s.trim().is_empty()) {
                match entry.trim().parse::<i32>().ok().and_then(weekday_from_sunday_index) {
                    Some(day) => {
                        if !days.contains(&day) {
                            days.push(day);
                        }
                    }
                    None => tracing::warn!(
                        schedule_id = %self.id,
                        value = entry,
                        "schedule has invalid entry in multiple_days_of_week"
                    ),
                }
            }
        }

        if days.is_empty()
            && matches!(
                self.recurrence_pattern,
                RecurrencePattern::Weekly | RecurrencePattern::BiWeekly
            )
        {
            let fallback = self.start_date.weekday();
            tracing::info!(
                schedule_id = %self.id,
                weekday = ?fallback,
                "schedule has no valid weekdays, falling back to start date's weekday"
            );
            days.push(fallback);
        }

        days
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.scheduled_datetime
            .map(|dt| dt.time())
            .unwrap_or_else(|| {
                NaiveTime::from_hms_opt(DEFAULT_TIME_OF_DAY.0, DEFAULT_TIME_OF_DAY.1, 0)
                    .unwrap_or(NaiveTime::MIN)
            })
    }

    pub fn recurrence_spec(&self) -> RecurrenceSpec {
        RecurrenceSpec {
            pattern: self.recurrence_pattern,
            start_date: self.start_date,
            end_date: self.end_date,
            days_of_week: self.days_of_week(),
            day_of_month: self.recurrence_day_of_month.and_then(|d| u32::try_from(d).ok()),
            time_of_day: self.time_of_day(),
        }
    }
}

/// Maps the stored 0 = Sunday .. 6 = Saturday convention to chrono weekdays.
pub fn weekday_from_sunday_index(value: i32) -> Option<Weekday> {
    match value {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub template_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub scheduled_datetime: Option<DateTime<Utc>>,
    pub recurrence_pattern: RecurrencePattern,
    #[validate(range(min = 0, max = 6))]
    pub recurrence_day_of_week: Option<i32>,
    #[validate(range(min = 1, max = 31))]
    pub recurrence_day_of_month: Option<i32>,
    pub multiple_days_of_week: Option<String>,
    pub send_reminder: Option<bool>,
    #[validate(range(min = 1, max = 168))]
    pub reminder_hours_before: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateScheduleRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub scheduled_datetime: Option<DateTime<Utc>>,
    #[validate(range(min = 0, max = 6))]
    pub recurrence_day_of_week: Option<i32>,
    #[validate(range(min = 1, max = 31))]
    pub recurrence_day_of_month: Option<i32>,
    pub multiple_days_of_week: Option<String>,
    pub send_reminder: Option<bool>,
    #[validate(range(min = 1, max = 168))]
    pub reminder_hours_before: Option<i32>,
}
