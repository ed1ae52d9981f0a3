//! Inspection report downloads.

use std::path::Path;

use inspdb_core::InspectionRecord;

use crate::client::PortalClient;
use crate::error::ScraperError;

const MAX_COMPONENT_CHARS: usize = 200;

/// Counts from one [`download_reports`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    /// Already on disk from an earlier run.
    pub existing: usize,
    pub failed: usize,
}

/// Filesystem-safe name for one component: reserved characters become `_`,
/// leading/trailing dots and spaces are dropped, length is capped.
#[must_use]
pub fn sanitize_component(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    replaced
        .trim_matches(|c| c == '.' || c == ' ')
        .chars()
        .take(MAX_COMPONENT_CHARS)
        .collect()
}

/// `<region>_<business>_<location>_<date>.pdf`, lowercased where it helps
/// sorting. The location is the license number, or the address when the
/// record has none, and is left out when both are blank.
#[must_use]
pub fn report_filename(record: &InspectionRecord) -> String {
    let region = sanitize_component(&record.region.to_lowercase());
    let business = slug(&record.business_name);
    let date = sanitize_component(&record.inspection_date.replace('/', "-"));
    let location = record
        .license_number
        .as_deref()
        .filter(|license| !license.trim().is_empty())
        .unwrap_or(&record.address);
    let location = slug(location);

    if location.is_empty() {
        format!("{region}_{business}_{date}.pdf")
    } else {
        format!("{region}_{business}_{location}_{date}.pdf")
    }
}

fn slug(raw: &str) -> String {
    sanitize_component(&raw.trim().to_lowercase().replace(' ', "_"))
}

/// Downloads every record's report into `dir`, skipping records without a
/// link and files that already exist. Failures are logged and counted.
pub async fn download_reports(
    client: &PortalClient,
    records: &[InspectionRecord],
    dir: &Path,
) -> DownloadSummary {
    let mut summary = DownloadSummary::default();

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::error!(dir = %dir.display(), error = %e, "cannot create report directory");
        summary.failed = records.iter().filter(|r| !r.report_link.is_empty()).count();
        return summary;
    }

    for record in records.iter().filter(|r| !r.report_link.is_empty()) {
        let path = dir.join(report_filename(record));
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            summary.existing += 1;
            continue;
        }

        match download_one(client, &record.report_link, &path).await {
            Ok(bytes) => {
                summary.downloaded += 1;
                tracing::debug!(path = %path.display(), bytes, "saved report");
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(
                    region = %record.region,
                    business = %record.business_name,
                    url = %record.report_link,
                    error = %e,
                    "report download failed"
                );
            }
        }
    }

    tracing::info!(
        downloaded = summary.downloaded,
        existing = summary.existing,
        failed = summary.failed,
        "report downloads finished"
    );
    summary
}

async fn download_one(client: &PortalClient, url: &str, path: &Path) -> Result<usize, ScraperError> {
    let bytes = client.get_bytes(url).await?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| ScraperError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
    Ok(bytes.len())
}
