//! Per-region orchestration: strategy dispatch and the page loop.
//!
//! Both strategies reduce to a [`PageSource`] that turns a page number into
//! records plus a "more pages" flag. [`run_pages`] owns everything else:
//! the page ceiling, the courtesy delay, the stop conditions, and the
//! counters.

mod legacy;
pub mod payload;
mod portal;

use std::time::Duration;

use inspdb_core::{InspectionRecord, RegionTarget, ScraperType};
use serde::Serialize;
use tracing::Instrument;

use crate::client::PortalClient;
use crate::error::ScraperError;

pub use payload::build_search_payload;

/// Hard page ceiling per region, whatever the configuration says.
pub const MAX_PAGES_CEILING: u32 = 100;

/// Per-region counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeStats {
    pub pages_scraped: u32,
    pub records_found: usize,
    pub errors: u32,
}

/// Everything one region produced. Partial when `stats.errors > 0`.
#[derive(Debug, Clone)]
pub struct RegionOutcome {
    pub region: String,
    pub records: Vec<InspectionRecord>,
    pub stats: ScrapeStats,
}

/// Run-wide knobs layered over each region's own settings.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Portal landing page used by regions without their own `url`.
    pub landing_url: String,
    pub max_pages_override: Option<u32>,
    pub delay_override: Option<Duration>,
}

impl ScrapeOptions {
    #[must_use]
    pub fn new(landing_url: impl Into<String>) -> Self {
        Self {
            landing_url: landing_url.into(),
            max_pages_override: None,
            delay_override: None,
        }
    }

    /// Quick-check mode: one page per region and a one-second delay.
    #[must_use]
    pub fn test_mode(mut self) -> Self {
        self.max_pages_override = Some(1);
        self.delay_override = Some(Duration::from_secs(1));
        self
    }

    #[must_use]
    pub fn page_limit(&self, target: &RegionTarget) -> u32 {
        self.max_pages_override
            .unwrap_or(target.max_pages)
            .min(MAX_PAGES_CEILING)
    }

    #[must_use]
    pub fn delay(&self, target: &RegionTarget) -> Duration {
        self.delay_override
            .unwrap_or_else(|| Duration::from_secs(target.delay_secs))
    }

    #[must_use]
    pub fn landing_url_for<'a>(&'a self, target: &'a RegionTarget) -> &'a str {
        target
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.landing_url)
    }
}

/// One fetched and extracted page.
#[derive(Debug)]
pub(crate) struct Page {
    pub records: Vec<InspectionRecord>,
    pub has_more: bool,
}

/// A strategy's way of producing result pages.
pub(crate) trait PageSource {
    async fn fetch_page(&mut self, page: u32) -> Result<Page, ScraperError>;
}

/// Drives `source` from page 1 until a stop condition:
///
/// - a page yields no records (natural end)
/// - the page reports no further pages
/// - `page_limit` is reached
/// - a page fails, which is counted in `errors`
///
/// Records gathered before a failure are kept. `delay` is slept before
/// every page after the first.
pub(crate) async fn run_pages<S: PageSource>(
    source: &mut S,
    page_limit: u32,
    delay: Duration,
) -> (Vec<InspectionRecord>, ScrapeStats) {
    let mut records = Vec::new();
    let mut stats = ScrapeStats::default();

    for page in 1..=page_limit {
        if page > 1 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let fetched = match source.fetch_page(page).await {
            Ok(fetched) => fetched,
            Err(e) => {
                stats.errors += 1;
                tracing::error!(page, error = %e, "page failed, ending region early");
                break;
            }
        };

        if fetched.records.is_empty() {
            tracing::info!(page, "no results on page, pagination complete");
            break;
        }

        stats.pages_scraped += 1;
        stats.records_found += fetched.records.len();
        tracing::info!(page, records = fetched.records.len(), "scraped page");
        records.extend(fetched.records);

        if !fetched.has_more {
            tracing::debug!(page, "no further pages");
            break;
        }
        if page == page_limit {
            tracing::info!(page_limit, "page limit reached");
        }
    }

    (records, stats)
}

/// Scrapes one region with the strategy its configuration names.
///
/// Never fails: request and parse errors end the region early and are
/// counted in the outcome's stats.
pub async fn scrape_region(
    client: &PortalClient,
    target: &RegionTarget,
    options: &ScrapeOptions,
) -> RegionOutcome {
    let span = tracing::info_span!(
        "region",
        region = %target.key,
        strategy = %target.scraper_type
    );

    async {
        tracing::info!(search_value = %target.search_value, "starting region scrape");
        let (records, stats) = match target.scraper_type {
            ScraperType::Portal => portal::scrape(client, target, options).await,
            ScraperType::Legacy => legacy::scrape(client, target, options).await,
        };
        tracing::info!(
            pages = stats.pages_scraped,
            records = stats.records_found,
            errors = stats.errors,
            "region scrape finished"
        );
        RegionOutcome {
            region: target.key.clone(),
            records,
            stats,
        }
    }
    .instrument(span)
    .await
}
