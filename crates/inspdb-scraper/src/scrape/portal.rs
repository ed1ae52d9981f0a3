//! Vendor-portal strategy.
//!
//! Page 1 tries a few API paths for a JSON search endpoint. If one
//! answers, every later page is requested from it alone; otherwise the
//! detected search form is submitted and the HTML result page is parsed.

use std::collections::BTreeMap;

use inspdb_core::{InspectionRecord, RegionTarget};
use scraper::Html;
use serde_json::Value;

use super::{build_search_payload, run_pages, Page, PageSource, ScrapeOptions, ScrapeStats};
use crate::client::{FormData, PortalClient};
use crate::detect::{detect, FormMethod, SiteStructure};
use crate::error::ScraperError;
use crate::extract::{
    extract_records, extract_records_from_json, result_items, FieldAliases, FieldSelectors,
    RESULT_ROW_CANDIDATES,
};
use crate::fallback::{first_match_async, split_alternatives};
use crate::origin::PortalBase;
use crate::pagination::{has_next_page, json_has_more};

/// API paths, relative to the portal base, that may serve JSON search results.
const JSON_ENDPOINT_SUFFIXES: &[&str] = &[
    "api/search",
    "api/inspections",
    "api/inspections/search",
    "search.json",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum JsonEndpoint {
    Untried,
    Found(String),
    Unavailable,
}

struct PortalSource<'a> {
    client: &'a PortalClient,
    target: &'a RegionTarget,
    base: PortalBase,
    structure: SiteStructure,
    candidates: Vec<String>,
    fields: FieldSelectors,
    aliases: FieldAliases,
    json: JsonEndpoint,
}

pub(super) async fn scrape(
    client: &PortalClient,
    target: &RegionTarget,
    options: &ScrapeOptions,
) -> (Vec<InspectionRecord>, ScrapeStats) {
    let landing_url = options.landing_url_for(target);
    let base = match PortalBase::parse(landing_url) {
        Ok(base) => base,
        Err(e) => {
            tracing::error!(error = %e, "cannot scrape region");
            return (
                Vec::new(),
                ScrapeStats {
                    errors: 1,
                    ..ScrapeStats::default()
                },
            );
        }
    };

    let structure = detect(client, landing_url).await;
    if !structure.has_form {
        tracing::warn!(
            url = landing_url,
            region_field = %structure.region_field,
            "no region search form found, submitting with defaults"
        );
    }

    let mut source = PortalSource {
        client,
        target,
        base,
        candidates: candidate_selectors(&structure, &target.selectors),
        structure,
        fields: FieldSelectors::with_overrides(&target.selectors),
        aliases: FieldAliases::default(),
        json: JsonEndpoint::Untried,
    };
    run_pages(&mut source, options.page_limit(target), options.delay(target)).await
}

/// Row selectors for result pages: a configured `row` override, then what
/// the landing page suggested, then the generic candidates. No duplicates.
fn candidate_selectors(structure: &SiteStructure, overrides: &BTreeMap<String, String>) -> Vec<String> {
    let configured = overrides
        .get("row")
        .map(|row| split_alternatives(row))
        .unwrap_or_default();

    let mut candidates: Vec<String> = Vec::new();
    for selector in configured
        .into_iter()
        .chain(structure.result_selectors.iter().map(String::as_str))
        .chain(RESULT_ROW_CANDIDATES.iter().copied())
    {
        if !candidates.iter().any(|c| c == selector) {
            candidates.push(selector.to_owned());
        }
    }
    candidates
}

impl PageSource for PortalSource<'_> {
    async fn fetch_page(&mut self, page: u32) -> Result<Page, ScraperError> {
        let payload = build_search_payload(self.target, &self.structure, page);

        let json = match self.json {
            JsonEndpoint::Found(ref endpoint) => {
                let endpoint = endpoint.clone();
                Some(self.fetch_json(&endpoint, &payload).await?)
            }
            JsonEndpoint::Untried => self.discover_json(&payload).await,
            JsonEndpoint::Unavailable => None,
        };
        if let Some(json) = json {
            let records =
                extract_records_from_json(&json, &self.aliases, &self.target.key, &self.base);
            let items = result_items(&json).map_or(0, <[Value]>::len);
            return Ok(Page {
                records,
                has_more: json_has_more(items),
            });
        }

        let action = self.structure.form_action.as_str();
        let response = match self.structure.form_method {
            FormMethod::Get => self.client.get_with_query(action, &payload).await?,
            FormMethod::Post => self.client.post_form(action, &payload).await?,
        };
        Ok(self.parse_html(&response.body))
    }
}

impl PortalSource<'_> {
    fn parse_html(&self, body: &str) -> Page {
        let document = Html::parse_document(body);
        let records = extract_records(
            &document,
            &self.candidates,
            &self.fields,
            &self.target.key,
            &self.base,
        );
        Page {
            records,
            has_more: has_next_page(&document),
        }
    }

    /// Page 1 only: tries each API path and remembers the first one that
    /// answers with a JSON result container. Failures here are misses.
    async fn discover_json(&mut self, payload: &FormData) -> Option<Value> {
        let endpoints: Vec<String> = JSON_ENDPOINT_SUFFIXES
            .iter()
            .map(|suffix| self.base.endpoint(suffix))
            .collect();
        let hit = first_match_async(
            &endpoints,
            |endpoint| self.try_endpoint(endpoint, payload),
            Option::is_some,
        )
        .await;

        match hit {
            Some(hit) => {
                tracing::info!(endpoint = %hit.candidate, "portal serves JSON search results");
                self.json = JsonEndpoint::Found(hit.candidate.clone());
                hit.value
            }
            None => {
                tracing::debug!("no JSON search endpoint, using HTML form results");
                self.json = JsonEndpoint::Unavailable;
                None
            }
        }
    }

    async fn try_endpoint(&self, endpoint: &str, payload: &FormData) -> Option<Value> {
        let response = match self.client.post_form_for_json(endpoint, payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(endpoint, error = %e, "JSON endpoint request failed");
                return None;
            }
        };
        if !response.is_json() {
            tracing::debug!(endpoint, "endpoint did not answer with JSON");
            return None;
        }

        let value: Value = match serde_json::from_str(&response.body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(endpoint, error = %e, "endpoint sent malformed JSON");
                return None;
            }
        };
        if is_empty_json(&value) || result_items(&value).is_none() {
            tracing::debug!(endpoint, "JSON response has no results");
            return None;
        }
        Some(value)
    }

    /// Later pages of a chosen JSON endpoint. Request and parse failures
    /// are page failures; there is no fallback to the HTML form.
    async fn fetch_json(&self, endpoint: &str, payload: &FormData) -> Result<Value, ScraperError> {
        let response = self.client.post_form_for_json(endpoint, payload).await?;
        serde_json::from_str(&response.body).map_err(|source| ScraperError::Deserialize {
            context: endpoint.to_owned(),
            source,
        })
    }
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
