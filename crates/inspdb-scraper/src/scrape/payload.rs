//! Search payload construction.

use inspdb_core::RegionTarget;

use crate::client::FormData;
use crate::detect::SiteStructure;
use crate::pagination::JSON_PAGE_SIZE;

/// Optional filters the portal expects present even when unused.
const EMPTY_FILTER_FIELDS: &[&str] = &["name", "address", "start_date", "end_date", "license"];

/// Builds the form payload for one results page.
///
/// Layering, later wins:
/// 1. hidden inputs found on the landing page
/// 2. empty optional filters (only where not already present)
/// 3. the region's static `form_fields`
/// 4. the region search value under the detected field name, unless
///    `form_fields` sets that field itself
/// 5. `page` and `offset`
#[must_use]
pub fn build_search_payload(target: &RegionTarget, structure: &SiteStructure, page: u32) -> FormData {
    let mut payload: FormData = structure.hidden_fields.iter().cloned().collect();

    for field in EMPTY_FILTER_FIELDS {
        payload.entry((*field).to_owned()).or_default();
    }

    payload.extend(
        target
            .form_fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    if !target.form_fields.contains_key(&structure.region_field) {
        payload.insert(structure.region_field.clone(), target.search_value.clone());
    }

    let offset = usize::try_from(page.saturating_sub(1))
        .unwrap_or(usize::MAX)
        .saturating_mul(JSON_PAGE_SIZE);
    payload.insert("page".to_owned(), page.to_string());
    payload.insert("offset".to_owned(), offset.to_string());
    payload
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use inspdb_core::ScraperType;

    use super::*;

    fn target() -> RegionTarget {
        RegionTarget {
            key: "washtenaw".to_owned(),
            search_value: "MI - Washtenaw".to_owned(),
            scraper_type: ScraperType::Portal,
            delay_secs: 0,
            max_pages: 10,
            selectors: BTreeMap::new(),
            url: None,
            form_fields: BTreeMap::new(),
        }
    }

    fn structure() -> SiteStructure {
        let mut structure = SiteStructure::fallback("https://swordsolutions.com/inspections/");
        structure.region_field = "ddlCounty".to_owned();
        structure.hidden_fields = vec![
            ("csrf".to_owned(), "abc123".to_owned()),
            ("name".to_owned(), "prefilled".to_owned()),
        ];
        structure
    }

    #[test]
    fn payload_carries_region_filters_and_paging() {
        let payload = build_search_payload(&target(), &structure(), 3);
        assert_eq!(payload["ddlCounty"], "MI - Washtenaw");
        assert_eq!(payload["page"], "3");
        assert_eq!(payload["offset"], "40");
        assert_eq!(payload["address"], "");
        assert_eq!(payload["start_date"], "");
        assert_eq!(payload["end_date"], "");
        assert_eq!(payload["license"], "");
        assert_eq!(payload["csrf"], "abc123");
    }

    #[test]
    fn hidden_values_are_not_blanked_by_filters() {
        let payload = build_search_payload(&target(), &structure(), 1);
        assert_eq!(payload["name"], "prefilled");
        assert_eq!(payload["offset"], "0");
    }

    #[test]
    fn form_fields_override_and_may_set_region_field() {
        let mut target = target();
        target.form_fields = BTreeMap::from([
            ("ddlCounty".to_owned(), "81".to_owned()),
            ("csrf".to_owned(), "mine".to_owned()),
        ]);
        let payload = build_search_payload(&target, &structure(), 1);
        assert_eq!(payload["ddlCounty"], "81");
        assert_eq!(payload["csrf"], "mine");
    }
}
