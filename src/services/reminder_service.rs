use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::engine::recurrence::next_occurrence;
use crate::models::{CreateNotification, NotificationKind, RecurrencePattern, WorkoutSchedule};
use crate::services::NotificationService;

/// Sends upcoming-workout reminders as in-app notifications. Recurring
/// schedules are reminded once per occurrence; `last_reminder_sent` is the
/// guard that keeps the 15-minute cadence from repeating one.
#[derive(Clone)]
pub struct ReminderService {
    db: PgPool,
    notifications: NotificationService,
}

/// A reminder is due once `now` enters the window ahead of the occurrence,
/// unless one was already sent inside that same window.
fn reminder_is_due(
    now: DateTime<Utc>,
    occurrence: DateTime<Utc>,
    hours_before: i64,
    last_reminder_sent: Option<DateTime<Utc>>,
) -> bool {
    if occurrence <= now {
        return false;
    }
    let window_opens = occurrence - Duration::hours(hours_before);
    if now < window_opens {
        return false;
    }
    last_reminder_sent.map(|sent| sent < window_opens).unwrap_or(true)
}

impl ReminderService {
    pub fn new(db: PgPool) -> Self {
        let notifications = NotificationService::new(db.clone());
        Self { db, notifications }
    }

    pub async fn process_reminders(&self) -> Result<u32> {
        let now = Utc::now();
        let mut reminders_sent = 0u32;

        let schedules = sqlx::query_as::<_, WorkoutSchedule>(
            "SELECT * FROM workout_schedules WHERE is_active = TRUE AND send_reminder = TRUE",
        )
        .fetch_all(&self.db)
        .await?;

        for schedule in schedules {
            let occurrence = match self.upcoming(&schedule, now) {
                Some(occurrence) => occurrence,
                None => continue,
            };

            if !reminder_is_due(
                now,
                occurrence,
                schedule.reminder_hours_before as i64,
                schedule.last_reminder_sent,
            ) {
                continue;
            }

            if let Err(e) = self.send_reminder(&schedule, occurrence).await {
                tracing::error!(
                    schedule_id = %schedule.id,
                    error = %e,
                    "failed to send workout reminder"
                );
                continue;
            }

            sqlx::query(
                "UPDATE workout_schedules SET last_reminder_sent = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(schedule.id)
            .bind(now)
            .execute(&self.db)
            .await?;

            reminders_sent += 1;
        }

        if reminders_sent > 0 {
            tracing::info!(reminders_sent, "sent workout reminders");
        }
        Ok(reminders_sent)
    }

    fn upcoming(&self, schedule: &WorkoutSchedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if schedule.is_recurring && schedule.recurrence_pattern != RecurrencePattern::Once {
            next_occurrence(&schedule.recurrence_spec(), now.naive_utc())
                .map(|occurrence| occurrence.and_utc())
        } else {
            schedule.scheduled_datetime
        }
    }

    async fn send_reminder(
        &self,
        schedule: &WorkoutSchedule,
        occurrence: DateTime<Utc>,
    ) -> Result<()> {
        let when = occurrence.format("%A, %B %-d at %H:%M").to_string();

        let mut body = format!(
            "Your workout '{}' is scheduled for {}.",
            schedule.name, when
        );
        if let Some(description) = &schedule.description {
            body.push_str(&format!(" {description}"));
        }

        self.notifications
            .create(CreateNotification {
                user_id: schedule.client_id,
                kind: NotificationKind::WorkoutReminder,
                title: format!("Reminder: {}", schedule.name),
                body,
                schedule_id: Some(schedule.id),
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn due_inside_the_window_with_no_prior_reminder() {
        assert!(reminder_is_due(at(10, 16), at(10, 17), 2, None));
    }

    #[test]
    fn not_due_before_the_window_opens() {
        assert!(!reminder_is_due(at(10, 8), at(10, 17), 2, None));
    }

    #[test]
    fn not_due_once_the_occurrence_has_passed() {
        assert!(!reminder_is_due(at(10, 18), at(10, 17), 2, None));
    }

    #[test]
    fn one_reminder_per_occurrence() {
        // Already reminded inside this occurrence's window.
        assert!(!reminder_is_due(at(10, 16), at(10, 17), 2, Some(at(10, 15))));
    }

    #[test]
    fn a_past_reminder_does_not_block_the_next_occurrence() {
        // Reminded for last week's session; this week's window reopens.
        assert!(reminder_is_due(at(17, 16), at(17, 17), 2, Some(at(10, 15))));
    }
}
