use anyhow::Result;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CreateScheduleRequest, RecurrencePattern, UpdateScheduleRequest, WorkoutSchedule,
};

#[derive(Debug, Error)]
pub enum ScheduleValidationError {
    #[error("one-time schedules need a scheduled date/time")]
    MissingScheduledDateTime,
    #[error("weekly schedules need at least one day of the week")]
    MissingDaysOfWeek,
    #[error("monthly schedules need a day of the month")]
    MissingDayOfMonth,
    #[error("end date cannot be before start date")]
    EndBeforeStart,
}

/// Cross-field checks the derive-level validation cannot express.
pub fn validate_schedule_request(
    request: &CreateScheduleRequest,
) -> Result<(), ScheduleValidationError> {
    if let Some(end) = request.end_date {
        if end < request.start_date {
            return Err(ScheduleValidationError::EndBeforeStart);
        }
    }

    match request.recurrence_pattern {
        RecurrencePattern::Once => {
            if request.scheduled_datetime.is_none() {
                return Err(ScheduleValidationError::MissingScheduledDateTime);
            }
        }
        RecurrencePattern::Weekly | RecurrencePattern::BiWeekly => {
            let has_primary = request.recurrence_day_of_week.is_some();
            let has_extra = request
                .multiple_days_of_week
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            if !has_primary && !has_extra {
                return Err(ScheduleValidationError::MissingDaysOfWeek);
            }
        }
        RecurrencePattern::Monthly => {
            if request.recurrence_day_of_month.is_none() {
                return Err(ScheduleValidationError::MissingDayOfMonth);
            }
        }
        RecurrencePattern::Daily => {}
    }

    Ok(())
}

/// Inserts a schedule row; shared with the assignment flow so both run under
/// the caller's transaction.
pub(crate) async fn insert_schedule<'a>(
    executor: impl sqlx::PgExecutor<'a>,
    assignment_id: Option<Uuid>,
    client_id: Uuid,
    coach_id: Uuid,
    request: &CreateScheduleRequest,
) -> Result<WorkoutSchedule> {
    let is_recurring = request.recurrence_pattern != RecurrencePattern::Once;

    let schedule = sqlx::query_as::<_, WorkoutSchedule>(
        r#"
        INSERT INTO workout_schedules (
            assignment_id, template_id, client_id, coach_id, name, description,
            start_date, end_date, scheduled_datetime, is_recurring, recurrence_pattern,
            recurrence_day_of_week, recurrence_day_of_month, multiple_days_of_week,
            send_reminder, reminder_hours_before
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *
        "#,
    )
    .bind(assignment_id)
    .bind(request.template_id)
    .bind(client_id)
    .bind(coach_id)
    .bind(&request.name)
    .bind(&request.description)
    .bind(request.start_date)
    .bind(request.end_date)
    .bind(request.scheduled_datetime)
    .bind(is_recurring)
    .bind(request.recurrence_pattern)
    .bind(request.recurrence_day_of_week)
    .bind(request.recurrence_day_of_month)
    .bind(&request.multiple_days_of_week)
    .bind(request.send_reminder.unwrap_or(true))
    .bind(request.reminder_hours_before.unwrap_or(24))
    .fetch_one(executor)
    .await?;

    Ok(schedule)
}

#[derive(Clone)]
pub struct ScheduleService {
    db: PgPool,
}

impl ScheduleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_schedule(
        &self,
        client_id: Uuid,
        coach_id: Uuid,
        request: CreateScheduleRequest,
    ) -> Result<WorkoutSchedule> {
        let schedule = insert_schedule(&self.db, None, client_id, coach_id, &request).await?;
        Ok(schedule)
    }

    pub async fn get_schedule(&self, id: Uuid) -> Result<Option<WorkoutSchedule>> {
        let schedule =
            sqlx::query_as::<_, WorkoutSchedule>("SELECT * FROM workout_schedules WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(schedule)
    }

    pub async fn get_schedules_for_client(&self, client_id: Uuid) -> Result<Vec<WorkoutSchedule>> {
        let schedules = sqlx::query_as::<_, WorkoutSchedule>(
            "SELECT * FROM workout_schedules WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.db)
        .await?;

        Ok(schedules)
    }

    pub async fn update_schedule(
        &self,
        id: Uuid,
        request: UpdateScheduleRequest,
    ) -> Result<Option<WorkoutSchedule>> {
        let schedule = sqlx::query_as::<_, WorkoutSchedule>(
            r#"
            UPDATE workout_schedules
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                end_date = COALESCE($4, end_date),
                scheduled_datetime = COALESCE($5, scheduled_datetime),
                recurrence_day_of_week = COALESCE($6, recurrence_day_of_week),
                recurrence_day_of_month = COALESCE($7, recurrence_day_of_month),
                multiple_days_of_week = COALESCE($8, multiple_days_of_week),
                send_reminder = COALESCE($9, send_reminder),
                reminder_hours_before = COALESCE($10, reminder_hours_before),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.end_date)
        .bind(request.scheduled_datetime)
        .bind(request.recurrence_day_of_week)
        .bind(request.recurrence_day_of_month)
        .bind(request.multiple_days_of_week)
        .bind(request.send_reminder)
        .bind(request.reminder_hours_before)
        .fetch_optional(&self.db)
        .await?;

        Ok(schedule)
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<WorkoutSchedule>> {
        let schedule = sqlx::query_as::<_, WorkoutSchedule>(
            r#"
            UPDATE workout_schedules
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.db)
        .await?;

        Ok(schedule)
    }

    pub async fn delete_schedule(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workout_schedules WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn base_request(pattern: RecurrencePattern) -> CreateScheduleRequest {
        CreateScheduleRequest {
            template_id: None,
            name: "Morning strength".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: None,
            scheduled_datetime: None,
            recurrence_pattern: pattern,
            recurrence_day_of_week: None,
            recurrence_day_of_month: None,
            multiple_days_of_week: None,
            send_reminder: None,
            reminder_hours_before: None,
        }
    }

    #[test]
    fn once_requires_scheduled_datetime() {
        let mut request = base_request(RecurrencePattern::Once);
        assert!(matches!(
            validate_schedule_request(&request),
            Err(ScheduleValidationError::MissingScheduledDateTime)
        ));

        request.scheduled_datetime = Some(Utc::now());
        assert!(validate_schedule_request(&request).is_ok());
    }

    #[test]
    fn weekly_requires_a_day() {
        let mut request = base_request(RecurrencePattern::Weekly);
        assert!(matches!(
            validate_schedule_request(&request),
            Err(ScheduleValidationError::MissingDaysOfWeek)
        ));

        request.multiple_days_of_week = Some("1,3".to_string());
        assert!(validate_schedule_request(&request).is_ok());
    }

    #[test]
    fn monthly_requires_day_of_month() {
        let mut request = base_request(RecurrencePattern::Monthly);
        assert!(matches!(
            validate_schedule_request(&request),
            Err(ScheduleValidationError::MissingDayOfMonth)
        ));

        request.recurrence_day_of_month = Some(15);
        assert!(validate_schedule_request(&request).is_ok());
    }

    #[test]
    fn end_date_must_follow_start() {
        let mut request = base_request(RecurrencePattern::Daily);
        request.end_date = Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!(matches!(
            validate_schedule_request(&request),
            Err(ScheduleValidationError::EndBeforeStart)
        ));
    }
}
