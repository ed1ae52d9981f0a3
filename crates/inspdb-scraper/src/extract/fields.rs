//! Logical record fields and the selector / alias lists that locate them.

use std::collections::BTreeMap;

use crate::fallback::split_alternatives;

/// A logical field of an inspection record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    BusinessName,
    Address,
    Date,
    Violations,
    Severity,
    ReportLink,
    License,
    EstablishmentType,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::BusinessName,
        Field::Address,
        Field::Date,
        Field::Violations,
        Field::Severity,
        Field::ReportLink,
        Field::License,
        Field::EstablishmentType,
    ];

    /// Key used for this field in a region's `selectors` map.
    #[must_use]
    pub fn config_key(self) -> &'static str {
        match self {
            Field::BusinessName => "business_name",
            Field::Address => "address",
            Field::Date => "date",
            Field::Violations => "violations",
            Field::Severity => "severity",
            Field::ReportLink => "report_link",
            Field::License => "license",
            Field::EstablishmentType => "type",
        }
    }

    fn from_config_key(key: &str) -> Option<Field> {
        match key {
            "business_name" | "name" => Some(Field::BusinessName),
            "address" => Some(Field::Address),
            "date" | "inspection_date" => Some(Field::Date),
            "violations" => Some(Field::Violations),
            "severity" => Some(Field::Severity),
            "report_link" | "link" => Some(Field::ReportLink),
            "license" | "license_number" => Some(Field::License),
            "type" | "establishment_type" => Some(Field::EstablishmentType),
            _ => None,
        }
    }

    fn default_selectors(self) -> &'static str {
        match self {
            Field::BusinessName => ".business-name, .establishment, td:first-child",
            Field::Address => ".address, td:nth-child(2)",
            Field::Date => ".inspection-date, .date, td:nth-child(3)",
            Field::Violations => ".violations, td:nth-child(4)",
            Field::Severity => ".severity, .risk, td:nth-child(5)",
            Field::ReportLink => "a[href$='.pdf'], a",
            Field::License => ".license",
            Field::EstablishmentType => ".establishment-type, .type",
        }
    }

    fn default_json_keys(self) -> &'static [&'static str] {
        match self {
            Field::BusinessName => &["name", "business_name", "facility_name", "establishment"],
            Field::Address => &["address", "location", "street_address"],
            Field::Date => &["inspection_date", "date", "inspected_on"],
            Field::Violations => &["violations", "violation_summary", "comments"],
            Field::Severity => &["severity", "risk", "risk_level", "priority"],
            Field::ReportLink => &["report_url", "pdf_url", "url", "link"],
            Field::License => &["license_number", "license", "permit_number"],
            Field::EstablishmentType => &["establishment_type", "facility_type", "type"],
        }
    }
}

/// Ordered CSS selector alternatives per field for HTML rows.
///
/// An empty list means the field is not extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelectors {
    by_field: BTreeMap<Field, Vec<String>>,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        let by_field = Field::ALL
            .into_iter()
            .map(|field| (field, owned_alternatives(field.default_selectors())))
            .collect();
        Self { by_field }
    }
}

impl FieldSelectors {
    /// Defaults with a region's overrides applied.
    ///
    /// Override values replace the default list for that field. An empty
    /// value disables the field. Keys that are not field names (such as
    /// `row` and `next`) are ignored here.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut selectors = Self::default();
        for (key, value) in overrides {
            if let Some(field) = Field::from_config_key(key.as_str()) {
                selectors.by_field.insert(field, owned_alternatives(value));
            }
        }
        selectors
    }

    #[must_use]
    pub fn get(&self, field: Field) -> &[String] {
        self.by_field
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Ordered key aliases per field for JSON result items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliases {
    by_field: BTreeMap<Field, Vec<String>>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        let by_field = Field::ALL
            .into_iter()
            .map(|field| {
                let keys = field
                    .default_json_keys()
                    .iter()
                    .map(|k| (*k).to_owned())
                    .collect();
                (field, keys)
            })
            .collect();
        Self { by_field }
    }
}

impl FieldAliases {
    #[must_use]
    pub fn get(&self, field: Field) -> &[String] {
        self.by_field
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Puts `key` first in the alias list for `field`.
    #[must_use]
    pub fn prefer(mut self, field: Field, key: &str) -> Self {
        let keys = self.by_field.entry(field).or_default();
        keys.retain(|k| k != key);
        keys.insert(0, key.to_owned());
        self
    }
}

fn owned_alternatives(spec: &str) -> Vec<String> {
    split_alternatives(spec)
        .into_iter()
        .map(str::to_owned)
        .collect()
}
