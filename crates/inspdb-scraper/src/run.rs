//! Multi-region runs.
//!
//! Regions are scraped one after another on one HTTP session. A region's
//! configuration error or failed pages never stop the regions after it.

use std::path::Path;

use inspdb_core::{InspectionRecord, RegionSelection};
use serde::Serialize;

use crate::client::PortalClient;
use crate::reports::{download_reports, DownloadSummary};
use crate::scrape::{scrape_region, ScrapeOptions, ScrapeStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegionStatus {
    Scraped(ScrapeStats),
    ConfigError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionReport {
    pub region: String,
    #[serde(flatten)]
    pub status: RegionStatus,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// All records, in region order then page order.
    pub records: Vec<InspectionRecord>,
    /// One entry per region touched, sorted by region key.
    pub regions: Vec<RegionReport>,
    pub downloads: Option<DownloadSummary>,
}

impl RunReport {
    /// Regions that hit a configuration error or at least one page error.
    #[must_use]
    pub fn failed_regions(&self) -> usize {
        self.regions
            .iter()
            .filter(|r| match &r.status {
                RegionStatus::Scraped(stats) => stats.errors > 0,
                RegionStatus::ConfigError { .. } => true,
            })
            .count()
    }
}

/// Scrapes every selected region in order.
///
/// With `reports_dir` set, each region's report documents are downloaded
/// right after that region finishes.
pub async fn run_regions(
    client: &PortalClient,
    selection: &RegionSelection,
    options: &ScrapeOptions,
    reports_dir: Option<&Path>,
) -> RunReport {
    let mut report = RunReport::default();

    for (region, err) in &selection.errors {
        tracing::error!(region = %region, error = %err, "skipping region with configuration error");
        report.regions.push(RegionReport {
            region: region.clone(),
            status: RegionStatus::ConfigError {
                message: err.to_string(),
            },
        });
    }

    for target in &selection.targets {
        let outcome = scrape_region(client, target, options).await;

        if let Some(dir) = reports_dir {
            let summary = download_reports(client, &outcome.records, dir).await;
            let total = report.downloads.get_or_insert_with(DownloadSummary::default);
            total.downloaded += summary.downloaded;
            total.existing += summary.existing;
            total.failed += summary.failed;
        }

        report.regions.push(RegionReport {
            region: outcome.region,
            status: RegionStatus::Scraped(outcome.stats),
        });
        report.records.extend(outcome.records);
    }

    report.regions.sort_by(|a, b| a.region.cmp(&b.region));
    tracing::info!(
        regions = report.regions.len(),
        records = report.records.len(),
        failed_regions = report.failed_regions(),
        "run finished"
    );
    report
}
