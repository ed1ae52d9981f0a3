//! The canonical output record produced by every scrape strategy.

use serde::{Deserialize, Serialize};

/// Normalized risk classification of an inspection outcome.
///
/// `Medium` is the default for any text that matches neither keyword bucket,
/// including empty text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inspection result for one establishment.
///
/// Records are built once per result row (or JSON item) and never mutated
/// afterwards. The serialized key names are what the dashboard reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    /// Region key from the regions config (e.g. `"washtenaw"`).
    #[serde(rename = "county")]
    pub region: String,
    pub business_name: String,
    #[serde(default)]
    pub address: String,
    /// `YYYY-MM-DD` when the raw text parsed, otherwise the trimmed raw text.
    #[serde(default)]
    pub inspection_date: String,
    #[serde(default)]
    pub violations: String,
    #[serde(default)]
    pub severity: Severity,
    /// Absolute URL, or empty when the row carried no report link.
    #[serde(default)]
    pub report_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub establishment_type: Option<String>,
}
