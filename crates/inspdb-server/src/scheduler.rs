//! Background job scheduler.
//!
//! With `INSPDB_SCRAPE_CRON` set, a recurring job starts the shared
//! [`ScrapeJob`]. A tick that lands while a run is in flight is skipped.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::job::ScrapeJob;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    job: ScrapeJob,
    cron: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match cron {
        Some(expr) => {
            register_scrape_job(&scheduler, job, expr).await?;
            tracing::info!(cron = expr, "scheduler: recurring scrape registered");
        }
        None => tracing::info!("scheduler: INSPDB_SCRAPE_CRON not set, no recurring scrape"),
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_scrape_job(
    scheduler: &JobScheduler,
    job: ScrapeJob,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let scheduled = Job::new_async(cron, move |_uuid, _lock| {
        let job = job.clone();
        Box::pin(async move {
            if !job.try_start("schedule") {
                tracing::warn!("scheduler: previous scrape still running, skipping tick");
            }
        })
    })?;

    scheduler.add(scheduled).await?;
    Ok(())
}
