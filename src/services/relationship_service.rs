use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    Capability, CoachClientPermission, CoachClientRelationship, CreateRelationshipRequest,
    RelationshipStatus, UpdatePermissionsRequest,
};

#[derive(Clone)]
pub struct RelationshipService {
    db: PgPool,
}

impl RelationshipService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates a pending relationship plus its default permission row in one
    /// transaction.
    pub async fn create_relationship(
        &self,
        coach_id: Uuid,
        request: CreateRelationshipRequest,
    ) -> Result<CoachClientRelationship> {
        let mut tx = self.db.begin().await?;

        let relationship = sqlx::query_as::<_, CoachClientRelationship>(
            r#"
            INSERT INTO coach_client_relationships (coach_id, client_id, status, notes)
            VALUES ($1, $2, 'pending', $3)
            RETURNING *
            "#,
        )
        .bind(coach_id)
        .bind(request.client_id)
        .bind(request.notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO coach_client_permissions (relationship_id) VALUES ($1)")
            .bind(relationship.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(relationship)
    }

    pub async fn get_relationship(&self, id: Uuid) -> Result<Option<CoachClientRelationship>> {
        let relationship = sqlx::query_as::<_, CoachClientRelationship>(
            "SELECT * FROM coach_client_relationships WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(relationship)
    }

    pub async fn get_clients_for_coach(
        &self,
        coach_id: Uuid,
    ) -> Result<Vec<CoachClientRelationship>> {
        let relationships = sqlx::query_as::<_, CoachClientRelationship>(
            "SELECT * FROM coach_client_relationships WHERE coach_id = $1 ORDER BY created_at DESC",
        )
        .bind(coach_id)
        .fetch_all(&self.db)
        .await?;

        Ok(relationships)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: RelationshipStatus,
    ) -> Result<Option<CoachClientRelationship>> {
        let start_date = match status {
            RelationshipStatus::Active => Some(Utc::now().date_naive()),
            _ => None,
        };
        let end_date = match status {
            RelationshipStatus::Ended => Some(Utc::now().date_naive()),
            _ => None,
        };

        let relationship = sqlx::query_as::<_, CoachClientRelationship>(
            r#"
            UPDATE coach_client_relationships
            SET status = $2,
                start_date = COALESCE($3, start_date),
                end_date = COALESCE($4, end_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(start_date)
        .bind(end_date)
        .fetch_optional(&self.db)
        .await?;

        Ok(relationship)
    }

    pub async fn get_permissions(
        &self,
        relationship_id: Uuid,
    ) -> Result<Option<CoachClientPermission>> {
        let permissions = sqlx::query_as::<_, CoachClientPermission>(
            "SELECT * FROM coach_client_permissions WHERE relationship_id = $1",
        )
        .bind(relationship_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(permissions)
    }

    pub async fn update_permissions(
        &self,
        relationship_id: Uuid,
        request: UpdatePermissionsRequest,
    ) -> Result<Option<CoachClientPermission>> {
        let permissions = sqlx::query_as::<_, CoachClientPermission>(
            r#"
            UPDATE coach_client_permissions
            SET can_view_workouts = COALESCE($2, can_view_workouts),
                can_create_workouts = COALESCE($3, can_create_workouts),
                can_modify_workouts = COALESCE($4, can_modify_workouts),
                can_delete_workouts = COALESCE($5, can_delete_workouts),
                can_view_reports = COALESCE($6, can_view_reports),
                can_assign_templates = COALESCE($7, can_assign_templates),
                can_message = COALESCE($8, can_message),
                updated_at = NOW()
            WHERE relationship_id = $1
            RETURNING *
            "#,
        )
        .bind(relationship_id)
        .bind(request.can_view_workouts)
        .bind(request.can_create_workouts)
        .bind(request.can_modify_workouts)
        .bind(request.can_delete_workouts)
        .bind(request.can_view_reports)
        .bind(request.can_assign_templates)
        .bind(request.can_message)
        .fetch_optional(&self.db)
        .await?;

        Ok(permissions)
    }

    /// Returns the active relationship between a coach and client, if any.
    pub async fn active_relationship(
        &self,
        coach_id: Uuid,
        client_id: Uuid,
    ) -> Result<Option<CoachClientRelationship>> {
        let relationship = sqlx::query_as::<_, CoachClientRelationship>(
            r#"
            SELECT * FROM coach_client_relationships
            WHERE coach_id = $1 AND client_id = $2 AND status = 'active'
            "#,
        )
        .bind(coach_id)
        .bind(client_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(relationship)
    }

    /// Checks that the coach has an active relationship with the client and
    /// that the named capability flag is granted.
    pub async fn has_capability(
        &self,
        coach_id: Uuid,
        client_id: Uuid,
        capability: Capability,
    ) -> Result<bool> {
        let relationship = match self.active_relationship(coach_id, client_id).await? {
            Some(relationship) => relationship,
            None => return Ok(false),
        };

        let permissions = match self.get_permissions(relationship.id).await? {
            Some(permissions) => permissions,
            None => return Ok(false),
        };

        let granted = match capability {
            Capability::ViewWorkouts => permissions.can_view_workouts,
            Capability::CreateWorkouts => permissions.can_create_workouts,
            Capability::ModifyWorkouts => permissions.can_modify_workouts,
            Capability::DeleteWorkouts => permissions.can_delete_workouts,
            Capability::ViewReports => permissions.can_view_reports,
            Capability::AssignTemplates => permissions.can_assign_templates,
            Capability::Message => permissions.can_message,
        };

        if !granted {
            tracing::debug!(
                %coach_id,
                %client_id,
                capability = capability.as_str(),
                "capability check denied"
            );
        }

        Ok(granted)
    }
}
