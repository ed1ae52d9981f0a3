//! Legacy strategy for the older server-rendered search page.
//!
//! The first page is a GET of the region's URL with the search value as a
//! query parameter. Later pages follow the page's own "next" link until it
//! is missing or points somewhere already visited.

use std::collections::HashSet;

use inspdb_core::{InspectionRecord, RegionTarget};
use scraper::{Html, Selector};

use super::{run_pages, Page, PageSource, ScrapeOptions, ScrapeStats};
use crate::client::{FormData, PortalClient};
use crate::error::ScraperError;
use crate::extract::{extract_records, FieldSelectors, RESULT_ROW_CANDIDATES};
use crate::fallback::split_alternatives;
use crate::origin::PortalBase;
use crate::pagination::next_page_url;

/// Query parameter the legacy search page reads the region from.
const LEGACY_REGION_PARAM: &str = "County";

struct LegacySource<'a> {
    client: &'a PortalClient,
    target: &'a RegionTarget,
    search_url: String,
    candidates: Vec<String>,
    fields: FieldSelectors,
    next_selector: Option<String>,
    next_url: Option<String>,
    visited: HashSet<String>,
}

pub(super) async fn scrape(
    client: &PortalClient,
    target: &RegionTarget,
    options: &ScrapeOptions,
) -> (Vec<InspectionRecord>, ScrapeStats) {
    let search_url = options.landing_url_for(target).to_owned();

    let checked = PortalBase::parse(&search_url).and_then(|_| {
        for key in ["row", "next"] {
            if let Some(spec) = target.selectors.get(key) {
                validate_selectors(spec)?;
            }
        }
        Ok(())
    });
    if let Err(e) = checked {
        tracing::error!(error = %e, "cannot scrape region");
        return (
            Vec::new(),
            ScrapeStats {
                errors: 1,
                ..ScrapeStats::default()
            },
        );
    }

    let mut candidates: Vec<String> = target
        .selectors
        .get("row")
        .map(|row| split_alternatives(row).into_iter().map(str::to_owned).collect())
        .unwrap_or_default();
    for css in RESULT_ROW_CANDIDATES {
        if !candidates.iter().any(|c| c == css) {
            candidates.push((*css).to_owned());
        }
    }

    let mut source = LegacySource {
        client,
        target,
        search_url,
        candidates,
        fields: FieldSelectors::with_overrides(&target.selectors),
        next_selector: target.selectors.get("next").cloned(),
        next_url: None,
        visited: HashSet::new(),
    };
    run_pages(&mut source, options.page_limit(target), options.delay(target)).await
}

/// Query for the first results page: static form fields plus the region.
fn legacy_query(target: &RegionTarget) -> FormData {
    let mut query = target.form_fields.clone();
    let has_region = query
        .keys()
        .any(|k| k.eq_ignore_ascii_case(LEGACY_REGION_PARAM));
    if !has_region {
        query.insert(LEGACY_REGION_PARAM.to_owned(), target.search_value.clone());
    }
    query.entry("Name".to_owned()).or_default();
    query
}

fn validate_selectors(spec: &str) -> Result<(), ScraperError> {
    for css in split_alternatives(spec) {
        Selector::parse(css).map_err(|e| ScraperError::Selector {
            selector: css.to_owned(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

impl PageSource for LegacySource<'_> {
    async fn fetch_page(&mut self, page: u32) -> Result<Page, ScraperError> {
        let response = if page == 1 {
            self.client
                .get_with_query(&self.search_url, &legacy_query(self.target))
                .await?
        } else {
            let Some(url) = self.next_url.take() else {
                return Ok(Page {
                    records: Vec::new(),
                    has_more: false,
                });
            };
            self.client.get(&url).await?
        };

        let base = PortalBase::parse(&response.url)?;
        let (records, next) = self.parse(&response.body, &response.url, &base);
        self.visited.insert(response.url);

        let next = next.filter(|url| !self.visited.contains(url));
        let has_more = next.is_some();
        self.next_url = next;
        Ok(Page { records, has_more })
    }
}

impl LegacySource<'_> {
    fn parse(&self, body: &str, page_url: &str, base: &PortalBase) -> (Vec<InspectionRecord>, Option<String>) {
        let document = Html::parse_document(body);
        let records = extract_records(
            &document,
            &self.candidates,
            &self.fields,
            &self.target.key,
            base,
        );
        let next = next_page_url(&document, page_url, self.next_selector.as_deref());
        (records, next)
    }
}
