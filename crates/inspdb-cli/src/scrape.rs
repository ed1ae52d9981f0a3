//! Default mode: scrape regions and write the output files.

use std::path::PathBuf;

use inspdb_core::AppConfig;
use inspdb_scraper::{run_regions, PortalClient, RegionStatus, RunReport, ScrapeOptions};

#[derive(Debug, Clone, Default)]
pub(crate) struct Args {
    pub county: Option<String>,
    pub test: bool,
    pub download_reports: bool,
}

pub(crate) async fn run(config: &AppConfig, client: &PortalClient, args: &Args) -> anyhow::Result<()> {
    let file = inspdb_core::load_regions(&config.regions_path)?;
    let selection = inspdb_core::select_regions(&file, args.county.as_deref());

    if selection.targets.is_empty() {
        let reasons: Vec<String> = selection
            .errors
            .iter()
            .map(|(_, err)| err.to_string())
            .collect();
        if reasons.is_empty() {
            anyhow::bail!(
                "no enabled regions in {}",
                config.regions_path.display()
            );
        }
        anyhow::bail!("nothing to scrape: {}", reasons.join("; "));
    }

    let mut options = ScrapeOptions::new(config.portal_url.clone());
    if args.test {
        options = options.test_mode();
        tracing::info!("test mode: one page per region");
    }
    let reports_dir = args
        .download_reports
        .then(|| config.output_dir.join("reports"));

    let report = run_regions(client, &selection, &options, reports_dir.as_deref()).await;
    log_summary(&report);

    let json_path = output_json_path(config, args.test);
    inspdb_core::write_json(&json_path, &report.records)?;
    tracing::info!(path = %json_path.display(), records = report.records.len(), "wrote JSON output");

    if !args.test {
        if report.records.is_empty() {
            tracing::warn!("no records scraped, skipping CSV output");
        } else {
            let csv_path = config.output_csv_path();
            inspdb_core::write_csv(&csv_path, &report.records)?;
            tracing::info!(path = %csv_path.display(), "wrote CSV output");
        }
    }

    if let Some(downloads) = report.downloads {
        tracing::info!(
            downloaded = downloads.downloaded,
            existing = downloads.existing,
            failed = downloads.failed,
            "inspection reports"
        );
    }

    let failed = report.failed_regions();
    if failed > 0 {
        tracing::warn!(failed_regions = failed, "some regions did not complete cleanly");
    }
    Ok(())
}

/// Canonical output, or a timestamped file for `--test` runs.
pub(crate) fn output_json_path(config: &AppConfig, test: bool) -> PathBuf {
    if test {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        config
            .output_dir
            .join(inspdb_core::test_output_filename(&stamp))
    } else {
        config.output_json_path()
    }
}

fn log_summary(report: &RunReport) {
    for region in &report.regions {
        match &region.status {
            RegionStatus::Scraped(stats) => tracing::info!(
                region = %region.region,
                pages = stats.pages_scraped,
                records = stats.records_found,
                errors = stats.errors,
                "region summary"
            ),
            RegionStatus::ConfigError { message } => tracing::error!(
                region = %region.region,
                error = %message,
                "region not scraped"
            ),
        }
    }
    tracing::info!(
        regions = report.regions.len(),
        records = report.records.len(),
        "scrape complete"
    );
}
