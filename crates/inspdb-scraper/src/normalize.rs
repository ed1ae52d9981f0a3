//! Field normalization from raw extracted strings to canonical values.
//!
//! Every function here is total: unparseable input is passed through
//! (trimmed) rather than rejected, and nothing panics on odd text.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use inspdb_core::{InspectionRecord, Severity};
use regex::Regex;

/// Date-only input patterns, tried in order. Month-first wins over
/// day-first when both would parse.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%m/%d/%y",
    "%m-%d-%y",
    "%m.%d.%y",
];

/// Timestamps some JSON endpoints return; only the date part is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const CRITICAL_KEYWORDS: &[&str] = &["critical", "crit", "high", "severe", "red"];
const LOW_KEYWORDS: &[&str] = &["low", "minor", "routine", "green"];

const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("St", "Street"),
    ("Ave", "Avenue"),
    ("Rd", "Road"),
    ("Dr", "Drive"),
    ("Blvd", "Boulevard"),
    ("Ln", "Lane"),
    ("Ct", "Court"),
    ("Pl", "Place"),
];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\s]+$").expect("static trailing punctuation pattern"));

static ABBREVIATION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    STREET_ABBREVIATIONS
        .iter()
        .map(|(abbr, full)| {
            let pattern = format!(r"(?i)\b{abbr}\b\.?");
            (
                Regex::new(&pattern).expect("static abbreviation pattern"),
                *full,
            )
        })
        .collect()
});

/// Normalizes a raw date string to `YYYY-MM-DD`.
///
/// Returns the trimmed input unchanged when no known pattern matches.
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    parse_date(trimmed).map_or_else(
        || trimmed.to_string(),
        |date| date.format("%Y-%m-%d").to_string(),
    )
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let plausible = |date: &NaiveDate| date.year() >= 1000;

    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .find(plausible)
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
                .find(plausible)
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Classifies free-form severity or risk text.
///
/// Critical keywords are checked before low ones; anything else, including
/// empty text, is [`Severity::Medium`].
#[must_use]
pub fn normalize_severity(raw: &str) -> Severity {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return Severity::Medium;
    }
    if CRITICAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Severity::Critical
    } else if LOW_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Severity::Low
    } else {
        Severity::Medium
    }
}

/// Trims, collapses internal whitespace, and strips trailing `,`/`;`.
#[must_use]
pub fn normalize_business_name(raw: &str) -> String {
    clean_text(raw)
}

/// Like [`normalize_business_name`], then expands street-type abbreviations
/// (whole word, case-insensitive, optional trailing period).
#[must_use]
pub fn normalize_address(raw: &str) -> String {
    let mut address = clean_text(raw);
    for (pattern, full) in ABBREVIATION_PATTERNS.iter() {
        address = pattern.replace_all(&address, *full).into_owned();
    }
    address
}

/// Collapses whitespace in violation text; punctuation is kept.
#[must_use]
pub fn normalize_violations(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Applies every field normalizer to a record. Idempotent.
#[must_use]
pub fn normalize_record(record: InspectionRecord) -> InspectionRecord {
    InspectionRecord {
        business_name: normalize_business_name(&record.business_name),
        address: normalize_address(&record.address),
        inspection_date: normalize_date(&record.inspection_date),
        violations: normalize_violations(&record.violations),
        ..record
    }
}

fn clean_text(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    TRAILING_PUNCTUATION.replace(&collapsed, "").into_owned()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
