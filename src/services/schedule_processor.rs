use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::engine::recurrence::{next_occurrence, previous_occurrence};
use crate::models::{
    RecurrencePattern, TemplateExercise, TemplateSet, WorkoutSchedule, WorkoutSession,
};

#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// How many hours ahead of their scheduled time sessions are created.
    pub hours_advance_creation: i64,
    /// How many hours late an occurrence may still be picked up, to cover
    /// missed processing cycles.
    pub max_hours_late: i64,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            hours_advance_creation: 24,
            max_hours_late: 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("schedule has no resolvable template")]
    MissingTemplate,
}

/// Converts due workout schedules into concrete workout sessions.
#[derive(Clone)]
pub struct ScheduleProcessor {
    db: PgPool,
    options: ProcessorOptions,
}

impl ScheduleProcessor {
    pub fn new(db: PgPool, options: ProcessorOptions) -> Self {
        Self { db, options }
    }

    /// Scans active schedules and materializes every occurrence that falls
    /// inside the `[now - max_hours_late, now + hours_advance_creation]`
    /// window. One failing schedule never aborts the batch.
    pub async fn process_due(&self) -> Result<u32> {
        let now = Utc::now();
        let window_start = now - Duration::hours(self.options.max_hours_late);
        let window_end = now + Duration::hours(self.options.hours_advance_creation);
        let mut sessions_created = 0u32;

        tracing::info!(%now, "starting scheduled workout processing");

        let schedules = sqlx::query_as::<_, WorkoutSchedule>(
            "SELECT * FROM workout_schedules WHERE is_active = TRUE",
        )
        .fetch_all(&self.db)
        .await?;

        for schedule in schedules {
            let occurrence = match self.due_occurrence(&schedule, now, window_start, window_end) {
                Some(occurrence) => occurrence,
                None => continue,
            };

            // The bookkeeping date is what keeps a 15-minute cadence from
            // materializing the same occurrence twice.
            if let Some(last) = schedule.last_generated_workout_date {
                if last >= occurrence {
                    continue;
                }
            }

            match self.materialize(&schedule, occurrence).await {
                Ok(session_id) => {
                    sessions_created += 1;
                    tracing::info!(
                        schedule_id = %schedule.id,
                        %session_id,
                        %occurrence,
                        "materialized workout session"
                    );
                }
                Err(e) => {
                    tracing::error!(schedule_id = %schedule.id, error = %e, "failed to materialize schedule");
                    if let Err(status_err) = self.record_failure(schedule.id, &e.to_string()).await
                    {
                        tracing::error!(
                            schedule_id = %schedule.id,
                            error = %status_err,
                            "failed to record generation failure"
                        );
                    }
                }
            }
        }

        tracing::info!(sessions_created, "completed scheduled workout processing");
        Ok(sessions_created)
    }

    fn due_occurrence(
        &self,
        schedule: &WorkoutSchedule,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if !schedule.is_recurring || schedule.recurrence_pattern == RecurrencePattern::Once {
            let scheduled = schedule.scheduled_datetime?;
            if scheduled >= window_start && scheduled <= window_end {
                return Some(scheduled);
            }
            return None;
        }

        let next = next_occurrence(&schedule.recurrence_spec(), now.naive_utc())?;
        let next = next.and_utc();
        if next >= window_start && next <= window_end {
            Some(next)
        } else {
            None
        }
    }

    /// Creates the session with its exercises and sets copied from the
    /// template, and updates the schedule bookkeeping, all in one
    /// transaction.
    async fn materialize(
        &self,
        schedule: &WorkoutSchedule,
        occurrence: DateTime<Utc>,
    ) -> Result<Uuid> {
        let template_id = self.resolve_template_id(schedule).await?;

        let exercises = sqlx::query_as::<_, TemplateExercise>(
            "SELECT * FROM template_exercises WHERE template_id = $1 ORDER BY sequence_num ASC",
        )
        .bind(template_id)
        .fetch_all(&self.db)
        .await?;

        let mut tx = self.db.begin().await?;

        let session = sqlx::query_as::<_, WorkoutSession>(
            r#"
            INSERT INTO workout_sessions
                (client_id, name, description, start_datetime, status,
                 template_id, assignment_id, schedule_id, is_from_coach)
            VALUES ($1, $2, $3, $4, 'scheduled', $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(schedule.client_id)
        .bind(&schedule.name)
        .bind(&schedule.description)
        .bind(occurrence)
        .bind(template_id)
        .bind(schedule.assignment_id)
        .bind(schedule.id)
        .bind(schedule.coach_id != schedule.client_id)
        .fetch_one(&mut *tx)
        .await?;

        for exercise in &exercises {
            let workout_exercise_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO workout_exercises
                    (session_id, template_exercise_id, exercise_name, sequence_num, rest_seconds, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(session.id)
            .bind(exercise.id)
            .bind(&exercise.exercise_name)
            .bind(exercise.sequence_num)
            .bind(exercise.rest_seconds)
            .bind(&exercise.notes)
            .fetch_one(&mut *tx)
            .await?;

            let sets = sqlx::query_as::<_, TemplateSet>(
                "SELECT * FROM template_sets WHERE template_exercise_id = $1 ORDER BY sequence_num ASC",
            )
            .bind(exercise.id)
            .fetch_all(&mut *tx)
            .await?;

            for (set_number, set) in sets.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO workout_sets
                        (workout_exercise_id, set_number, sequence_num, reps,
                         target_min_reps, target_max_reps, weight, rest_seconds, notes)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(workout_exercise_id)
                .bind(set_number as i32 + 1)
                .bind(set.sequence_num)
                .bind(set.default_reps)
                .bind(exercise.min_reps)
                .bind(exercise.max_reps)
                .bind(set.default_weight)
                .bind(exercise.rest_seconds.unwrap_or(60))
                .bind(&set.notes)
                .execute(&mut *tx)
                .await?;
            }
        }

        // One-time schedules are spent after their single session.
        let deactivate =
            !schedule.is_recurring || schedule.recurrence_pattern == RecurrencePattern::Once;

        sqlx::query(
            r#"
            UPDATE workout_schedules
            SET last_generated_workout_date = $2,
                total_workouts_generated = total_workouts_generated + 1,
                last_generation_status = 'ok',
                is_active = is_active AND NOT $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(schedule.id)
        .bind(occurrence)
        .bind(deactivate)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(session.id)
    }

    async fn resolve_template_id(&self, schedule: &WorkoutSchedule) -> Result<Uuid> {
        if let Some(template_id) = schedule.template_id {
            return Ok(template_id);
        }

        if let Some(assignment_id) = schedule.assignment_id {
            let template_id: Option<Uuid> =
                sqlx::query_scalar("SELECT template_id FROM template_assignments WHERE id = $1")
                    .bind(assignment_id)
                    .fetch_optional(&self.db)
                    .await?;
            if let Some(template_id) = template_id {
                return Ok(template_id);
            }
        }

        Err(GenerationError::MissingTemplate.into())
    }

    async fn record_failure(&self, schedule_id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            "UPDATE workout_schedules SET last_generation_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(schedule_id)
        .bind(format!("error: {reason}"))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Deactivates spent one-time schedules and recurring schedules whose end
    /// date is at least a day in the past.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let now = Utc::now();

        let one_time = sqlx::query(
            r#"
            UPDATE workout_schedules
            SET is_active = FALSE, updated_at = NOW()
            WHERE is_active = TRUE
              AND (NOT is_recurring OR recurrence_pattern = 'once')
              AND scheduled_datetime < $1
            "#,
        )
        .bind(now - Duration::days(1))
        .execute(&self.db)
        .await?
        .rows_affected();

        let recurring = sqlx::query(
            r#"
            UPDATE workout_schedules
            SET is_active = FALSE, updated_at = NOW()
            WHERE is_active = TRUE
              AND is_recurring
              AND recurrence_pattern <> 'once'
              AND end_date IS NOT NULL
              AND end_date < $1
            "#,
        )
        .bind((now - Duration::days(1)).date_naive())
        .execute(&self.db)
        .await?
        .rows_affected();

        let cleaned = one_time + recurring;
        tracing::info!(one_time, recurring, "deactivated expired schedules");
        Ok(cleaned)
    }

    /// Daily sweep over everything that slipped past the late window: created
    /// sessions that stayed in `scheduled` a full day are marked missed, and
    /// active schedules whose last due occurrence was never materialized at
    /// all (processor downtime longer than `max_hours_late`) record the miss
    /// in their generation status.
    pub async fn process_missed(&self) -> Result<u64> {
        let now = Utc::now();

        let missed_sessions = sqlx::query_as::<_, WorkoutSession>(
            r#"
            UPDATE workout_sessions
            SET status = 'missed'
            WHERE status = 'scheduled' AND start_datetime < $1
            RETURNING *
            "#,
        )
        .bind(now - Duration::days(1))
        .fetch_all(&self.db)
        .await?;

        for session in &missed_sessions {
            if let Some(schedule_id) = session.schedule_id {
                sqlx::query(
                    "UPDATE workout_schedules SET last_generation_status = 'missed', updated_at = NOW() WHERE id = $1",
                )
                .bind(schedule_id)
                .execute(&self.db)
                .await?;
            }
        }

        let skipped_schedules = self.sweep_skipped_occurrences(now).await?;

        let total = missed_sessions.len() as u64 + skipped_schedules;
        if total > 0 {
            tracing::info!(
                stale_sessions = missed_sessions.len(),
                skipped_schedules,
                "missed-workout sweep complete"
            );
        }
        Ok(total)
    }

    /// Flags schedules whose most recent due occurrence came and went with no
    /// session generated for it.
    async fn sweep_skipped_occurrences(&self, now: DateTime<Utc>) -> Result<u64> {
        // Anything newer than this may still be picked up by the regular scan.
        let cutoff = now - Duration::hours(self.options.max_hours_late);
        let mut flagged = 0u64;

        let schedules = sqlx::query_as::<_, WorkoutSchedule>(
            "SELECT * FROM workout_schedules WHERE is_active = TRUE",
        )
        .fetch_all(&self.db)
        .await?;

        for schedule in schedules {
            let occurrence = if schedule.is_recurring
                && schedule.recurrence_pattern != RecurrencePattern::Once
            {
                previous_occurrence(&schedule.recurrence_spec(), cutoff.naive_utc(), 2)
                    .map(|occurrence| occurrence.and_utc())
            } else {
                schedule.scheduled_datetime.filter(|scheduled| *scheduled < cutoff)
            };

            let occurrence = match occurrence {
                Some(occurrence) => occurrence,
                None => continue,
            };

            let generated = schedule
                .last_generated_workout_date
                .map(|last| last >= occurrence)
                .unwrap_or(false);
            if generated {
                continue;
            }

            sqlx::query(
                "UPDATE workout_schedules SET last_generation_status = 'missed', updated_at = NOW() WHERE id = $1",
            )
            .bind(schedule.id)
            .execute(&self.db)
            .await?;

            tracing::warn!(
                schedule_id = %schedule.id,
                %occurrence,
                "occurrence passed without a generated session"
            );
            flagged += 1;
        }

        Ok(flagged)
    }
}
