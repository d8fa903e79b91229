use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::progression::{
    deloaded_value, evaluate, increased_value, is_success, Decision, SessionOutcome,
};
use crate::models::{
    CreateNotification, CreateRuleRequest, NotificationKind, ProgressionHistory, ProgressionRule,
    RuleParameter, SessionStatus, TemplateSet, WorkoutExercise, WorkoutSession,
};
use crate::services::NotificationService;

#[derive(Clone)]
pub struct ProgressionService {
    db: PgPool,
    notifications: NotificationService,
}

impl ProgressionService {
    pub fn new(db: PgPool) -> Self {
        let notifications = NotificationService::new(db.clone());
        Self { db, notifications }
    }

    pub async fn create_rule(
        &self,
        coach_id: Uuid,
        request: CreateRuleRequest,
    ) -> Result<ProgressionRule> {
        let rule = sqlx::query_as::<_, ProgressionRule>(
            r#"
            INSERT INTO progression_rules (
                template_exercise_id, client_id, coach_id, name, rule_type, parameter,
                increment_value, consecutive_successes_required, success_threshold,
                maximum_value, apply_deload, deload_percentage, consecutive_failures_for_deload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(request.template_exercise_id)
        .bind(request.client_id)
        .bind(coach_id)
        .bind(&request.name)
        .bind(request.rule_type)
        .bind(request.parameter)
        .bind(request.increment_value)
        .bind(request.consecutive_successes_required.unwrap_or(2))
        .bind(request.success_threshold)
        .bind(request.maximum_value)
        .bind(request.apply_deload.unwrap_or(false))
        .bind(request.deload_percentage.unwrap_or(10.0))
        .bind(request.consecutive_failures_for_deload.unwrap_or(3))
        .fetch_one(&self.db)
        .await?;

        Ok(rule)
    }

    pub async fn get_rules_for_coach(&self, coach_id: Uuid) -> Result<Vec<ProgressionRule>> {
        let rules = sqlx::query_as::<_, ProgressionRule>(
            "SELECT * FROM progression_rules WHERE coach_id = $1 ORDER BY created_at DESC",
        )
        .bind(coach_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rules)
    }

    pub async fn set_rule_active(&self, rule_id: Uuid, is_active: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE progression_rules SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(rule_id)
        .bind(is_active)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_history(
        &self,
        rule_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<ProgressionHistory>> {
        let limit = limit.unwrap_or(50).min(100);
        let history = sqlx::query_as::<_, ProgressionHistory>(
            "SELECT * FROM progression_history WHERE rule_id = $1 ORDER BY applied_at DESC LIMIT $2",
        )
        .bind(rule_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(history)
    }

    /// Runs every active rule attached to the session's template exercises
    /// against the session outcome. Returns the number of applied actions.
    pub async fn evaluate_session(&self, session_id: Uuid) -> Result<u32> {
        let session = sqlx::query_as::<_, WorkoutSession>(
            "SELECT * FROM workout_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;

        let session = match session {
            Some(session) if session.status == SessionStatus::Completed => session,
            Some(_) | None => return Ok(0),
        };

        if session.template_id.is_none() {
            // Ad-hoc sessions have no template to progress.
            return Ok(0);
        }

        let exercises = sqlx::query_as::<_, WorkoutExercise>(
            r#"
            SELECT * FROM workout_exercises
            WHERE session_id = $1 AND template_exercise_id IS NOT NULL
            ORDER BY sequence_num ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.db)
        .await?;

        let mut actions_applied = 0u32;

        for exercise in exercises {
            let template_exercise_id = match exercise.template_exercise_id {
                Some(id) => id,
                None => continue,
            };

            let rules = sqlx::query_as::<_, ProgressionRule>(
                r#"
                SELECT * FROM progression_rules
                WHERE template_exercise_id = $1
                  AND is_active = TRUE
                  AND (client_id IS NULL OR client_id = $2)
                "#,
            )
            .bind(template_exercise_id)
            .bind(session.client_id)
            .fetch_all(&self.db)
            .await?;

            if rules.is_empty() {
                continue;
            }

            let outcome = self.exercise_outcome(exercise.id).await?;

            for rule in rules {
                match self.apply_rule(&rule, &session, &outcome).await {
                    Ok(true) => actions_applied += 1,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!(
                            rule_id = %rule.id,
                            %session_id,
                            error = %e,
                            "failed to apply progression rule"
                        );
                    }
                }
            }
        }

        Ok(actions_applied)
    }

    /// Completion rate and mean RPE across the sets of one session exercise.
    async fn exercise_outcome(&self, workout_exercise_id: Uuid) -> Result<SessionOutcome> {
        let row: (i64, i64, Option<f64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE is_completed),
                   AVG(rpe)::FLOAT8
            FROM workout_sets
            WHERE workout_exercise_id = $1
            "#,
        )
        .bind(workout_exercise_id)
        .fetch_one(&self.db)
        .await?;

        let completion_rate = if row.0 > 0 {
            row.1 as f64 / row.0 as f64 * 100.0
        } else {
            0.0
        };

        Ok(SessionOutcome {
            completion_rate,
            average_rpe: row.2,
        })
    }

    /// Evaluates one rule against the outcome, rewrites the template values
    /// when an action fires, and appends the audit row. Returns whether an
    /// increase or deload was applied.
    async fn apply_rule(
        &self,
        rule: &ProgressionRule,
        session: &WorkoutSession,
        outcome: &SessionOutcome,
    ) -> Result<bool> {
        let params = rule.params();
        let success = is_success(&params, outcome);

        let (success_streak, failure_streak) = if success {
            (rule.success_streak + 1, 0)
        } else {
            (0, rule.failure_streak + 1)
        };

        let current_value = match self.current_value(rule).await? {
            Some(value) => value,
            None => {
                // Nothing to progress; still keep the streaks moving.
                self.persist_streaks(rule.id, success_streak, failure_streak)
                    .await?;
                return Ok(false);
            }
        };

        let decision = evaluate(&params, current_value, success_streak, failure_streak);
        let streak_complete = success_streak >= params.consecutive_successes_required
            || (params.apply_deload && failure_streak >= params.consecutive_failures_for_deload);

        let mut tx = self.db.begin().await?;

        match decision {
            Decision::Increase { from, to } => {
                self.rewrite_template_values(&mut tx, rule, |value| increased_value(&params, value))
                    .await?;
                self.append_history(
                    &mut tx,
                    rule.id,
                    session.id,
                    "increase",
                    from,
                    to,
                    format!("{success_streak} consecutive successful sessions"),
                )
                .await?;
                self.reset_streaks(&mut tx, rule.id).await?;
            }
            Decision::Deload { from, to } => {
                self.rewrite_template_values(&mut tx, rule, |value| deloaded_value(&params, value))
                    .await?;
                self.append_history(
                    &mut tx,
                    rule.id,
                    session.id,
                    "deload",
                    from,
                    to,
                    format!("{failure_streak} consecutive failed sessions"),
                )
                .await?;
                self.reset_streaks(&mut tx, rule.id).await?;
            }
            Decision::Hold if streak_complete => {
                // The rule fired but clamping left the value unchanged;
                // record the hold and restart the streak.
                self.append_history(
                    &mut tx,
                    rule.id,
                    session.id,
                    "hold",
                    current_value,
                    current_value,
                    "adjustment produced no change".to_string(),
                )
                .await?;
                self.reset_streaks(&mut tx, rule.id).await?;
            }
            Decision::Hold => {
                sqlx::query(
                    r#"
                    UPDATE progression_rules
                    SET success_streak = $2, failure_streak = $3, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(rule.id)
                .bind(success_streak)
                .bind(failure_streak)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        let applied = matches!(
            decision,
            Decision::Increase { .. } | Decision::Deload { .. }
        );

        if applied {
            let (action, from, to) = match decision {
                Decision::Increase { from, to } => ("increased", from, to),
                Decision::Deload { from, to } => ("deloaded", from, to),
                Decision::Hold => unreachable!(),
            };
            if let Err(e) = self
                .notifications
                .create(CreateNotification {
                    user_id: session.client_id,
                    kind: NotificationKind::ProgressionApplied,
                    title: format!("Progression applied: {}", rule.name),
                    body: format!("Your target was {action} from {from} to {to}."),
                    schedule_id: None,
                })
                .await
            {
                tracing::warn!(rule_id = %rule.id, error = %e, "failed to notify progression");
            }
        }

        Ok(applied)
    }

    /// The tracked value is the first template set's default for the rule's
    /// parameter.
    async fn current_value(&self, rule: &ProgressionRule) -> Result<Option<f64>> {
        let value: Option<Option<f64>> = match rule.parameter {
            RuleParameter::Weight => sqlx::query_scalar(
                r#"
                SELECT default_weight FROM template_sets
                WHERE template_exercise_id = $1
                ORDER BY sequence_num ASC LIMIT 1
                "#,
            )
            .bind(rule.template_exercise_id)
            .fetch_optional(&self.db)
            .await?,
            RuleParameter::Reps => sqlx::query_scalar(
                r#"
                SELECT default_reps::FLOAT8 FROM template_sets
                WHERE template_exercise_id = $1
                ORDER BY sequence_num ASC LIMIT 1
                "#,
            )
            .bind(rule.template_exercise_id)
            .fetch_optional(&self.db)
            .await?,
        };

        Ok(value.flatten())
    }

    /// Applies the adjustment to every set of the rule's exercise so the next
    /// materialized session picks up the new targets.
    async fn rewrite_template_values(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        rule: &ProgressionRule,
        adjust: impl Fn(f64) -> f64,
    ) -> Result<()> {
        let sets = sqlx::query_as::<_, TemplateSet>(
            "SELECT * FROM template_sets WHERE template_exercise_id = $1",
        )
        .bind(rule.template_exercise_id)
        .fetch_all(&mut **tx)
        .await?;

        for set in sets {
            match rule.parameter {
                RuleParameter::Weight => {
                    if let Some(weight) = set.default_weight {
                        sqlx::query("UPDATE template_sets SET default_weight = $2 WHERE id = $1")
                            .bind(set.id)
                            .bind(adjust(weight))
                            .execute(&mut **tx)
                            .await?;
                    }
                }
                RuleParameter::Reps => {
                    if let Some(reps) = set.default_reps {
                        let adjusted = adjust(reps as f64).round().max(1.0) as i32;
                        sqlx::query("UPDATE template_sets SET default_reps = $2 WHERE id = $1")
                            .bind(set.id)
                            .bind(adjusted)
                            .execute(&mut **tx)
                            .await?;
                    }
                }
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_history(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        rule_id: Uuid,
        session_id: Uuid,
        action: &str,
        previous_value: f64,
        new_value: f64,
        reason: String,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO progression_history
                (rule_id, session_id, action, previous_value, new_value, reason, applied_automatically)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            "#,
        )
        .bind(rule_id)
        .bind(session_id)
        .bind(action)
        .bind(previous_value)
        .bind(new_value)
        .bind(reason)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn reset_streaks(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        rule_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE progression_rules SET success_streak = 0, failure_streak = 0, updated_at = NOW() WHERE id = $1",
        )
        .bind(rule_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn persist_streaks(
        &self,
        rule_id: Uuid,
        success_streak: i32,
        failure_streak: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE progression_rules
            SET success_streak = $2, failure_streak = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(rule_id)
        .bind(success_streak)
        .bind(failure_streak)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
