use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CreateFeedbackRequest, ExerciseFeedback, WorkoutFeedback};
use crate::services::ProgressionService;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("feedback was already submitted for this session")]
    AlreadySubmitted,
}

#[derive(Clone)]
pub struct FeedbackService {
    db: PgPool,
    progression: ProgressionService,
}

impl FeedbackService {
    pub fn new(db: PgPool) -> Self {
        let progression = ProgressionService::new(db.clone());
        Self { db, progression }
    }

    /// Records session feedback and per-set RPE, completes the session when
    /// the client hasn't done so explicitly, then runs progression rules
    /// against the finished session.
    pub async fn submit_feedback(
        &self,
        session_id: Uuid,
        client_id: Uuid,
        request: CreateFeedbackRequest,
    ) -> Result<WorkoutFeedback> {
        let mut tx = self.db.begin().await?;

        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM workout_feedback WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(FeedbackError::AlreadySubmitted.into());
        }

        let feedback = sqlx::query_as::<_, WorkoutFeedback>(
            r#"
            INSERT INTO workout_feedback
                (session_id, client_id, overall_rating, difficulty_rating,
                 energy_level, comments, completed_all_exercises, incomplete_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(client_id)
        .bind(request.overall_rating)
        .bind(request.difficulty_rating)
        .bind(request.energy_level)
        .bind(&request.comments)
        .bind(request.completed_all_exercises.unwrap_or(true))
        .bind(&request.incomplete_reason)
        .fetch_one(&mut *tx)
        .await?;

        for entry in &request.exercise_feedback {
            sqlx::query(
                r#"
                INSERT INTO exercise_feedback
                    (feedback_id, workout_set_id, rpe, difficulty, too_heavy, too_light, comments)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(feedback.id)
            .bind(entry.workout_set_id)
            .bind(entry.rpe)
            .bind(entry.difficulty)
            .bind(entry.too_heavy.unwrap_or(false))
            .bind(entry.too_light.unwrap_or(false))
            .bind(&entry.comments)
            .execute(&mut *tx)
            .await?;

            // The reported RPE lives on the set too so progression rules can
            // read it without joining through feedback. A set the client
            // rated is a set the client performed.
            sqlx::query("UPDATE workout_sets SET is_completed = TRUE, rpe = $2 WHERE id = $1")
                .bind(entry.workout_set_id)
                .bind(entry.rpe)
                .execute(&mut *tx)
                .await?;
        }

        if feedback.completed_all_exercises {
            sqlx::query(
                r#"
                UPDATE workout_sets SET is_completed = TRUE
                WHERE workout_exercise_id IN
                    (SELECT id FROM workout_exercises WHERE session_id = $1)
                "#,
            )
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE workout_sessions
            SET status = 'completed',
                completed_date = $2,
                end_datetime = COALESCE(end_datetime, $2),
                duration_minutes = COALESCE(
                    duration_minutes,
                    GREATEST(0, EXTRACT(EPOCH FROM ($2 - start_datetime)) / 60)::INT)
            WHERE id = $1 AND status <> 'completed'
            "#,
        )
        .bind(session_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        match self.progression.evaluate_session(session_id).await {
            Ok(applied) if applied > 0 => {
                tracing::info!(%session_id, applied, "progression actions applied after feedback");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(%session_id, error = %e, "progression evaluation failed");
            }
        }

        Ok(feedback)
    }

    pub async fn get_for_session(&self, session_id: Uuid) -> Result<Option<WorkoutFeedback>> {
        let feedback = sqlx::query_as::<_, WorkoutFeedback>(
            "SELECT * FROM workout_feedback WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(feedback)
    }

    pub async fn get_exercise_feedback(&self, feedback_id: Uuid) -> Result<Vec<ExerciseFeedback>> {
        let entries = sqlx::query_as::<_, ExerciseFeedback>(
            "SELECT * FROM exercise_feedback WHERE feedback_id = $1",
        )
        .bind(feedback_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    pub async fn get_unviewed_for_coach(&self, coach_id: Uuid) -> Result<Vec<WorkoutFeedback>> {
        let feedback = sqlx::query_as::<_, WorkoutFeedback>(
            r#"
            SELECT wf.* FROM workout_feedback wf
            JOIN workout_sessions ws ON ws.id = wf.session_id
            JOIN workout_schedules sch ON sch.id = ws.schedule_id
            WHERE sch.coach_id = $1 AND NOT wf.coach_viewed
            ORDER BY wf.created_at DESC
            "#,
        )
        .bind(coach_id)
        .fetch_all(&self.db)
        .await?;

        Ok(feedback)
    }

    pub async fn mark_coach_viewed(&self, feedback_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE workout_feedback SET coach_viewed = TRUE WHERE id = $1")
                .bind(feedback_id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
