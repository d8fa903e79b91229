use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateAssignmentRequest, TemplateAssignment, WorkoutSchedule};
use crate::services::schedule_service::insert_schedule;

#[derive(Clone)]
pub struct AssignmentService {
    db: PgPool,
}

impl AssignmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates the assignment and, when requested, its workout schedule in a
    /// single transaction.
    pub async fn create_assignment(
        &self,
        coach_id: Uuid,
        relationship_id: Option<Uuid>,
        request: CreateAssignmentRequest,
    ) -> Result<(TemplateAssignment, Option<WorkoutSchedule>)> {
        let mut tx = self.db.begin().await?;

        let assignment = sqlx::query_as::<_, TemplateAssignment>(
            r#"
            INSERT INTO template_assignments
                (template_id, client_id, coach_id, relationship_id, name, notes, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(request.template_id)
        .bind(request.client_id)
        .bind(coach_id)
        .bind(relationship_id)
        .bind(&request.name)
        .bind(&request.notes)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_one(&mut *tx)
        .await?;

        let schedule = match &request.schedule {
            Some(schedule_req) => {
                // The schedule inherits the assignment's template unless the
                // request names one directly.
                let mut schedule_req = schedule_req.clone();
                if schedule_req.template_id.is_none() {
                    schedule_req.template_id = Some(request.template_id);
                }
                let schedule = insert_schedule(
                    &mut *tx,
                    Some(assignment.id),
                    request.client_id,
                    coach_id,
                    &schedule_req,
                )
                .await?;
                Some(schedule)
            }
            None => None,
        };

        tx.commit().await?;

        tracing::info!(
            assignment_id = %assignment.id,
            client_id = %assignment.client_id,
            has_schedule = schedule.is_some(),
            "created template assignment"
        );

        Ok((assignment, schedule))
    }

    pub async fn get_assignment(&self, id: Uuid) -> Result<Option<TemplateAssignment>> {
        let assignment = sqlx::query_as::<_, TemplateAssignment>(
            "SELECT * FROM template_assignments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(assignment)
    }

    pub async fn get_assignments_for_client(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<TemplateAssignment>> {
        let assignments = sqlx::query_as::<_, TemplateAssignment>(
            "SELECT * FROM template_assignments WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.db)
        .await?;

        Ok(assignments)
    }

    pub async fn get_assignments_for_coach(
        &self,
        coach_id: Uuid,
    ) -> Result<Vec<TemplateAssignment>> {
        let assignments = sqlx::query_as::<_, TemplateAssignment>(
            "SELECT * FROM template_assignments WHERE coach_id = $1 ORDER BY created_at DESC",
        )
        .bind(coach_id)
        .fetch_all(&self.db)
        .await?;

        Ok(assignments)
    }

    /// Toggling an assignment also toggles the schedules hanging off it, so a
    /// paused assignment stops generating sessions.
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<TemplateAssignment>> {
        let mut tx = self.db.begin().await?;

        let assignment = sqlx::query_as::<_, TemplateAssignment>(
            "UPDATE template_assignments SET is_active = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&mut *tx)
        .await?;

        if assignment.is_some() {
            sqlx::query(
                "UPDATE workout_schedules SET is_active = $2, updated_at = NOW() WHERE assignment_id = $1",
            )
            .bind(id)
            .bind(is_active)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(assignment)
    }

    pub async fn delete_assignment(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM template_assignments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
