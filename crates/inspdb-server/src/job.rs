//! Single-flight background scrape.
//!
//! The trigger endpoint and the cron job share one [`ScrapeJob`]. At most
//! one run is in flight; a second start request is refused rather than
//! queued.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use inspdb_core::AppConfig;
use inspdb_scraper::{run_regions, PortalClient, ScrapeOptions};
use serde::Serialize;
use tokio::sync::Mutex;

/// What a finished run reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub records: usize,
    pub failed_regions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: RunSummary,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub running: bool,
    pub last_run: Option<LastRun>,
}

type RunFuture = Pin<Box<dyn Future<Output = anyhow::Result<RunSummary>> + Send>>;
type Runner = Arc<dyn Fn() -> RunFuture + Send + Sync>;

#[derive(Clone)]
pub struct ScrapeJob {
    runner: Runner,
    running: Arc<AtomicBool>,
    last_run: Arc<Mutex<Option<LastRun>>>,
}

/// Clears the in-flight flag when the spawned run ends, even by panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ScrapeJob {
    /// A job that scrapes every enabled region and rewrites the canonical
    /// output files.
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self::with_runner(move || {
            let config = Arc::clone(&config);
            Box::pin(async move { scrape_all(&config).await })
        })
    }

    pub fn with_runner<F>(runner: F) -> Self
    where
        F: Fn() -> RunFuture + Send + Sync + 'static,
    {
        Self {
            runner: Arc::new(runner),
            running: Arc::new(AtomicBool::new(false)),
            last_run: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawns a run unless one is already in flight. Returns whether a run
    /// was started.
    pub fn try_start(&self, trigger: &'static str) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!(trigger, "scrape already running, request ignored");
            return false;
        }

        let in_flight = InFlight(Arc::clone(&self.running));
        let runner = Arc::clone(&self.runner);
        let last_run = Arc::clone(&self.last_run);

        tokio::spawn(async move {
            let _in_flight = in_flight;
            let started_at = Utc::now();
            tracing::info!(trigger, "background scrape started");

            let result = runner().await;
            let finished_at = Utc::now();
            let run = match result {
                Ok(summary) => {
                    tracing::info!(
                        trigger,
                        records = summary.records,
                        failed_regions = summary.failed_regions,
                        "background scrape finished"
                    );
                    LastRun {
                        started_at,
                        finished_at,
                        summary,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!(trigger, error = %e, "background scrape failed");
                    LastRun {
                        started_at,
                        finished_at,
                        summary: RunSummary::default(),
                        error: Some(format!("{e:#}")),
                    }
                }
            };
            *last_run.lock().await = Some(run);
        });
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> JobStatus {
        JobStatus {
            running: self.is_running(),
            last_run: self.last_run.lock().await.clone(),
        }
    }
}

async fn scrape_all(config: &AppConfig) -> anyhow::Result<RunSummary> {
    let file = inspdb_core::load_regions(&config.regions_path)?;
    let selection = inspdb_core::select_regions(&file, None);
    let client = PortalClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_secs,
    )?;
    let options = ScrapeOptions::new(config.portal_url.clone());

    let report = run_regions(&client, &selection, &options, None).await;
    let summary = RunSummary {
        records: report.records.len(),
        failed_regions: report.failed_regions(),
    };

    if report.records.is_empty() {
        tracing::warn!("scrape produced no records, keeping previous output");
        return Ok(summary);
    }
    inspdb_core::write_json(&config.output_json_path(), &report.records)?;
    inspdb_core::write_csv(&config.output_csv_path(), &report.records)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;

    fn blocking_job(release: Arc<Notify>) -> ScrapeJob {
        ScrapeJob::with_runner(move || {
            let release = Arc::clone(&release);
            Box::pin(async move {
                release.notified().await;
                Ok(RunSummary {
                    records: 7,
                    failed_regions: 1,
                })
            })
        })
    }

    async fn wait_until_idle(job: &ScrapeJob) {
        for _ in 0..200 {
            if !job.is_running() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job never finished");
    }

    #[tokio::test]
    async fn second_start_is_refused_while_running() {
        let release = Arc::new(Notify::new());
        let job = blocking_job(Arc::clone(&release));

        assert!(job.try_start("test"));
        assert!(job.is_running());
        assert!(!job.try_start("test"));

        release.notify_one();
        wait_until_idle(&job).await;
        assert!(job.try_start("test"));
        release.notify_one();
        wait_until_idle(&job).await;
    }

    #[tokio::test]
    async fn finished_run_is_reported_in_status() {
        let release = Arc::new(Notify::new());
        let job = blocking_job(Arc::clone(&release));

        assert!(job.status().await.last_run.is_none());
        job.try_start("test");
        release.notify_one();
        wait_until_idle(&job).await;

        let status = job.status().await;
        assert!(!status.running);
        let last = status.last_run.expect("last run recorded");
        assert_eq!(last.summary.records, 7);
        assert_eq!(last.summary.failed_regions, 1);
        assert!(last.error.is_none());
    }

    #[tokio::test]
    async fn failed_run_records_error_and_frees_the_slot() {
        let job = ScrapeJob::with_runner(|| {
            Box::pin(async { Err(anyhow::anyhow!("regions file missing")) })
        });

        assert!(job.try_start("test"));
        wait_until_idle(&job).await;

        let last = job.status().await.last_run.expect("last run recorded");
        assert_eq!(last.error.as_deref(), Some("regions file missing"));
        assert!(job.try_start("test"));
        wait_until_idle(&job).await;
    }
}
