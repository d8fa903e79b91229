use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateNotification, Notification};

#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, notification: CreateNotification) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, title, body, schedule_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.schedule_id)
        .fetch_one(&self.db)
        .await?;

        Ok(notification)
    }

    pub async fn get_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>> {
        let limit = limit.unwrap_or(50).min(100);

        let notifications = if unread_only {
            sqlx::query_as::<_, Notification>(
                "SELECT * FROM notifications WHERE user_id = $1 AND read_at IS NULL ORDER BY created_at DESC LIMIT $2",
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, Notification>(
                "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await?
        };

        Ok(notifications)
    }

    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = $3 WHERE id = $1 AND user_id = $2 AND read_at IS NULL",
        )
        .bind(notification_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
