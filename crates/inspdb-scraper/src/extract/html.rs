//! Record extraction from server-rendered result pages.

use std::sync::LazyLock;

use inspdb_core::InspectionRecord;
use scraper::{ElementRef, Html, Selector};

use super::fields::{Field, FieldSelectors};
use crate::fallback::first_match;
use crate::normalize::{
    normalize_address, normalize_business_name, normalize_date, normalize_severity,
    normalize_violations,
};
use crate::origin::PortalBase;

/// Result-row containers seen on the portal's templates, most specific first.
pub const RESULT_ROW_CANDIDATES: &[&str] = &[
    "table.results tbody tr",
    "table.inspections tbody tr",
    "div.inspection-result",
    "div.result-row",
    "table tbody tr",
    ".inspection-list tr",
];

/// Broad patterns tried only after every candidate failed.
const FALLBACK_ROW_SELECTORS: &[&str] = &[
    "table tr",
    ".result",
    ".inspection",
    "[class*=\"result\"]",
    "[class*=\"inspection\"]",
];

/// A selector is accepted only when it matches more rows than this.
pub const ROW_COUNT_THRESHOLD: usize = 2;

/// Business names this short are layout debris, not establishments.
const MIN_NAME_CHARS: usize = 3;

static TH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").expect("static selector"));
static ANCHOR_WITH_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

/// Rows found on a page and the selector that found them.
#[derive(Debug)]
pub struct RowMatch<'a> {
    pub selector: String,
    pub rows: Vec<ElementRef<'a>>,
}

/// Finds result rows: the first candidate matching more than
/// [`ROW_COUNT_THRESHOLD`] elements wins, then the broad fallbacks are
/// tried the same way.
#[must_use]
pub fn find_rows<'a>(document: &'a Html, candidates: &[String]) -> Option<RowMatch<'a>> {
    let enough = |rows: &Vec<ElementRef<'a>>| rows.len() > ROW_COUNT_THRESHOLD;

    if let Some(hit) = first_match(candidates, |sel| select_all(document, sel), enough) {
        return Some(RowMatch {
            selector: hit.candidate.clone(),
            rows: hit.value,
        });
    }
    first_match(FALLBACK_ROW_SELECTORS, |sel| select_all(document, sel), enough).map(|hit| {
        RowMatch {
            selector: (*hit.candidate).to_owned(),
            rows: hit.value,
        }
    })
}

/// Extracts normalized records from an HTML result page.
///
/// Header rows are skipped, as are rows whose business name is shorter
/// than three characters after normalization. Report links are made
/// absolute against `base`.
#[must_use]
pub fn extract_records(
    document: &Html,
    candidates: &[String],
    fields: &FieldSelectors,
    region: &str,
    base: &PortalBase,
) -> Vec<InspectionRecord> {
    let Some(found) = find_rows(document, candidates) else {
        tracing::debug!(region, "no result rows matched any selector");
        return Vec::new();
    };
    tracing::debug!(
        region,
        selector = %found.selector,
        rows = found.rows.len(),
        "matched result rows"
    );

    let compiled = CompiledFields::compile(fields);
    found
        .rows
        .into_iter()
        .filter(|row| !is_header_row(*row))
        .filter_map(|row| extract_row(row, &compiled, region, base))
        .collect()
}

fn extract_row(
    row: ElementRef<'_>,
    fields: &CompiledFields,
    region: &str,
    base: &PortalBase,
) -> Option<InspectionRecord> {
    let business_name = normalize_business_name(&fields.text(row, Field::BusinessName));
    if business_name.chars().count() < MIN_NAME_CHARS {
        return None;
    }

    Some(InspectionRecord {
        region: region.to_owned(),
        business_name,
        address: normalize_address(&fields.text(row, Field::Address)),
        inspection_date: normalize_date(&fields.text(row, Field::Date)),
        violations: normalize_violations(&fields.text(row, Field::Violations)),
        severity: normalize_severity(&fields.text(row, Field::Severity)),
        report_link: base.absolutize(&fields.href(row, Field::ReportLink)),
        license_number: non_empty(fields.text(row, Field::License)),
        establishment_type: non_empty(fields.text(row, Field::EstablishmentType)),
    })
}

/// A row is a header if it sits in a `<thead>` or holds `<th>` cells.
#[must_use]
pub fn is_header_row(row: ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "thead")
        || row.select(&TH).next().is_some()
}

/// Whitespace-joined text content of an element.
#[must_use]
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => document.select(&sel).collect(),
        Err(e) => {
            tracing::warn!(selector, error = %e, "skipping invalid row selector");
            Vec::new()
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Field selectors parsed once per page.
struct CompiledFields {
    by_field: Vec<(Field, Vec<Selector>)>,
}

impl CompiledFields {
    fn compile(fields: &FieldSelectors) -> Self {
        let by_field = Field::ALL
            .into_iter()
            .map(|field| {
                let selectors = fields
                    .get(field)
                    .iter()
                    .filter_map(|s| match Selector::parse(s) {
                        Ok(sel) => Some(sel),
                        Err(e) => {
                            tracing::warn!(
                                field = field.config_key(),
                                selector = %s,
                                error = %e,
                                "skipping invalid field selector"
                            );
                            None
                        }
                    })
                    .collect();
                (field, selectors)
            })
            .collect();
        Self { by_field }
    }

    fn selectors(&self, field: Field) -> &[Selector] {
        self.by_field
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, sels)| sels.as_slice())
            .unwrap_or_default()
    }

    /// Text of the first element matched by the first alternative that
    /// yields non-empty text.
    fn text(&self, row: ElementRef<'_>, field: Field) -> String {
        first_match(
            self.selectors(field),
            |sel| row.select(sel).next().map(element_text).unwrap_or_default(),
            |text| !text.trim().is_empty(),
        )
        .map(|hit| hit.value)
        .unwrap_or_default()
    }

    /// `href` of the first matched element, or of the first link inside it.
    fn href(&self, row: ElementRef<'_>, field: Field) -> String {
        let href_of = |el: ElementRef<'_>| {
            el.value()
                .attr("href")
                .or_else(|| {
                    el.select(&ANCHOR_WITH_HREF)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                })
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_owned)
        };
        first_match(
            self.selectors(field),
            |sel| row.select(sel).find_map(&href_of),
            Option::is_some,
        )
        .and_then(|hit| hit.value)
        .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "html_test.rs"]
mod tests;
