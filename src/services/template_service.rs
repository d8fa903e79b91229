use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    CreateTemplateRequest, TemplateDetail, TemplateExercise, TemplateExerciseDetail, TemplateSet,
    WorkoutTemplate,
};

#[derive(Clone)]
pub struct TemplateService {
    db: PgPool,
}

impl TemplateService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates a template with its exercises and sets in one transaction.
    pub async fn create_template(
        &self,
        coach_id: Uuid,
        request: CreateTemplateRequest,
    ) -> Result<TemplateDetail> {
        let mut tx = self.db.begin().await?;

        let template = sqlx::query_as::<_, WorkoutTemplate>(
            r#"
            INSERT INTO workout_templates (coach_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(coach_id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&mut *tx)
        .await?;

        let mut exercises = Vec::with_capacity(request.exercises.len());
        for (exercise_idx, exercise_req) in request.exercises.into_iter().enumerate() {
            let exercise = sqlx::query_as::<_, TemplateExercise>(
                r#"
                INSERT INTO template_exercises
                    (template_id, exercise_name, sequence_num, rest_seconds, min_reps, max_reps, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(template.id)
            .bind(&exercise_req.exercise_name)
            .bind(exercise_idx as i32)
            .bind(exercise_req.rest_seconds)
            .bind(exercise_req.min_reps)
            .bind(exercise_req.max_reps)
            .bind(&exercise_req.notes)
            .fetch_one(&mut *tx)
            .await?;

            let mut sets = Vec::with_capacity(exercise_req.sets.len());
            for (set_idx, set_req) in exercise_req.sets.into_iter().enumerate() {
                let set = sqlx::query_as::<_, TemplateSet>(
                    r#"
                    INSERT INTO template_sets
                        (template_exercise_id, sequence_num, default_reps, default_weight, notes)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(exercise.id)
                .bind(set_idx as i32)
                .bind(set_req.default_reps)
                .bind(set_req.default_weight)
                .bind(&set_req.notes)
                .fetch_one(&mut *tx)
                .await?;
                sets.push(set);
            }

            exercises.push(TemplateExerciseDetail { exercise, sets });
        }

        tx.commit().await?;
        Ok(TemplateDetail {
            template,
            exercises,
        })
    }

    pub async fn get_templates_by_coach(&self, coach_id: Uuid) -> Result<Vec<WorkoutTemplate>> {
        let templates = sqlx::query_as::<_, WorkoutTemplate>(
            "SELECT * FROM workout_templates WHERE coach_id = $1 ORDER BY name ASC",
        )
        .bind(coach_id)
        .fetch_all(&self.db)
        .await?;

        Ok(templates)
    }

    pub async fn get_template_detail(&self, template_id: Uuid) -> Result<Option<TemplateDetail>> {
        let template = sqlx::query_as::<_, WorkoutTemplate>(
            "SELECT * FROM workout_templates WHERE id = $1",
        )
        .bind(template_id)
        .fetch_optional(&self.db)
        .await?;

        let template = match template {
            Some(template) => template,
            None => return Ok(None),
        };

        let exercises = sqlx::query_as::<_, TemplateExercise>(
            "SELECT * FROM template_exercises WHERE template_id = $1 ORDER BY sequence_num ASC",
        )
        .bind(template_id)
        .fetch_all(&self.db)
        .await?;

        let mut details = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            let sets = sqlx::query_as::<_, TemplateSet>(
                "SELECT * FROM template_sets WHERE template_exercise_id = $1 ORDER BY sequence_num ASC",
            )
            .bind(exercise.id)
            .fetch_all(&self.db)
            .await?;
            details.push(TemplateExerciseDetail { exercise, sets });
        }

        Ok(Some(TemplateDetail {
            template,
            exercises: details,
        }))
    }

    pub async fn delete_template(&self, template_id: Uuid, coach_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workout_templates WHERE id = $1 AND coach_id = $2")
            .bind(template_id)
            .bind(coach_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
