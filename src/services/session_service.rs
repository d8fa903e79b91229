use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    CompleteSessionRequest, SessionDetail, SessionExerciseDetail, SessionStatus, SessionSummary,
    WorkoutExercise, WorkoutSession, WorkoutSet,
};

#[derive(Clone)]
pub struct SessionService {
    db: PgPool,
}

impl SessionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<Option<WorkoutSession>> {
        let session =
            sqlx::query_as::<_, WorkoutSession>("SELECT * FROM workout_sessions WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(session)
    }

    pub async fn get_sessions_for_client(
        &self,
        client_id: Uuid,
        status: Option<SessionStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<WorkoutSession>> {
        let limit = limit.unwrap_or(50).min(100);
        let offset = offset.unwrap_or(0);

        let sessions = if let Some(status) = status {
            sqlx::query_as::<_, WorkoutSession>(
                r#"
                SELECT * FROM workout_sessions
                WHERE client_id = $1 AND status = $2
                ORDER BY start_datetime DESC LIMIT $3 OFFSET $4
                "#,
            )
            .bind(client_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, WorkoutSession>(
                r#"
                SELECT * FROM workout_sessions
                WHERE client_id = $1
                ORDER BY start_datetime DESC LIMIT $2 OFFSET $3
                "#,
            )
            .bind(client_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?
        };

        Ok(sessions)
    }

    pub async fn get_session_detail(&self, session_id: Uuid) -> Result<Option<SessionDetail>> {
        let session = match self.get_session(session_id).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        let exercises = sqlx::query_as::<_, WorkoutExercise>(
            "SELECT * FROM workout_exercises WHERE session_id = $1 ORDER BY sequence_num ASC",
        )
        .bind(session_id)
        .fetch_all(&self.db)
        .await?;

        let mut details = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            let sets = sqlx::query_as::<_, WorkoutSet>(
                "SELECT * FROM workout_sets WHERE workout_exercise_id = $1 ORDER BY sequence_num ASC",
            )
            .bind(exercise.id)
            .fetch_all(&self.db)
            .await?;
            details.push(SessionExerciseDetail { exercise, sets });
        }

        Ok(Some(SessionDetail {
            session,
            exercises: details,
        }))
    }

    /// Marks the session complete, recording per-set results and the overall
    /// duration in one transaction. Progression evaluation happens separately
    /// once the session is completed.
    pub async fn complete_session(
        &self,
        session_id: Uuid,
        request: CompleteSessionRequest,
    ) -> Result<Option<WorkoutSession>> {
        let now = Utc::now();
        let end_datetime = request.end_datetime.unwrap_or(now);

        let mut tx = self.db.begin().await?;

        for set_result in request.completed_sets.unwrap_or_default() {
            sqlx::query(
                r#"
                UPDATE workout_sets
                SET reps = COALESCE($2, reps),
                    weight = COALESCE($3, weight),
                    is_completed = $4
                WHERE id = $1
                "#,
            )
            .bind(set_result.set_id)
            .bind(set_result.reps)
            .bind(set_result.weight)
            .bind(set_result.is_completed)
            .execute(&mut *tx)
            .await?;
        }

        let session = sqlx::query_as::<_, WorkoutSession>(
            r#"
            UPDATE workout_sessions
            SET status = 'completed',
                completed_date = $2,
                end_datetime = $3,
                duration_minutes = GREATEST(0, EXTRACT(EPOCH FROM ($3 - start_datetime)) / 60)::INT
            WHERE id = $1 AND status <> 'completed'
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(now)
        .bind(end_datetime)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(session)
    }

    pub async fn get_summary(&self, client_id: Uuid) -> Result<SessionSummary> {
        let row: (i64, i64, i64, Option<i64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'completed'),
                   COUNT(*) FILTER (WHERE status = 'missed'),
                   SUM(duration_minutes)::BIGINT
            FROM workout_sessions
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.db)
        .await?;

        Ok(SessionSummary {
            total_sessions: row.0,
            completed_sessions: row.1,
            missed_sessions: row.2,
            total_duration_minutes: row.3,
        })
    }
}
