use anyhow::{anyhow, Result};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::services::{ProcessorOptions, ReminderService, ScheduleProcessor};

/// Cron-driven background work: schedule materialization and reminders every
/// fifteen minutes, cleanup and the missed-session sweep once a day.
pub struct JobRunner {
    scheduler: JobScheduler,
}

impl JobRunner {
    pub async fn start(db: PgPool, config: &AppConfig) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create job scheduler: {}", e))?;

        let options = ProcessorOptions {
            hours_advance_creation: config.hours_advance_creation,
            max_hours_late: config.max_hours_late,
        };

        let processor = ScheduleProcessor::new(db.clone(), options);
        let job = Job::new_async("0 */15 * * * *", move |_uuid, _l| {
            let processor = processor.clone();
            Box::pin(async move {
                if let Err(e) = processor.process_due().await {
                    error!(error = %e, "scheduled workout processing failed");
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create processing job: {}", e))?;
        scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add processing job: {}", e))?;

        let reminders = ReminderService::new(db.clone());
        let job = Job::new_async("0 */15 * * * *", move |_uuid, _l| {
            let reminders = reminders.clone();
            Box::pin(async move {
                if let Err(e) = reminders.process_reminders().await {
                    error!(error = %e, "reminder processing failed");
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create reminder job: {}", e))?;
        scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add reminder job: {}", e))?;

        let processor = ScheduleProcessor::new(db.clone(), ProcessorOptions::default());
        let job = Job::new_async("0 0 1 * * *", move |_uuid, _l| {
            let processor = processor.clone();
            Box::pin(async move {
                if let Err(e) = processor.cleanup_expired().await {
                    error!(error = %e, "schedule cleanup failed");
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create cleanup job: {}", e))?;
        scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add cleanup job: {}", e))?;

        let processor = ScheduleProcessor::new(db, ProcessorOptions::default());
        let job = Job::new_async("0 0 2 * * *", move |_uuid, _l| {
            let processor = processor.clone();
            Box::pin(async move {
                if let Err(e) = processor.process_missed().await {
                    error!(error = %e, "missed session sweep failed");
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create missed-session job: {}", e))?;
        scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add missed-session job: {}", e))?;

        scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start job scheduler: {}", e))?;

        info!("Background job scheduler started");
        Ok(Self { scheduler })
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to stop job scheduler: {}", e))?;
        info!("Background job scheduler stopped");
        Ok(())
    }
}
