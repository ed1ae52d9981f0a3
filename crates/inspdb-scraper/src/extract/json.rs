//! Record extraction from the portal's JSON search responses.

use inspdb_core::InspectionRecord;
use serde_json::Value;

use super::fields::{Field, FieldAliases};
use crate::fallback::first_match;
use crate::normalize::{
    normalize_address, normalize_business_name, normalize_date, normalize_severity,
    normalize_violations,
};
use crate::origin::PortalBase;

/// Object keys that may hold the result array, in lookup order.
pub const CONTAINER_KEYS: &[&str] = &["results", "data", "records"];

/// Locates the array of result items in a JSON payload.
///
/// Accepts a bare top-level array, an array under one of
/// [`CONTAINER_KEYS`], or one such array nested a single level deeper
/// (`{"data": {"results": [...]}}`). Returns `None` when the payload has no
/// recognizable container.
#[must_use]
pub fn result_items(payload: &Value) -> Option<&[Value]> {
    match payload {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(map) => {
            let direct = CONTAINER_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array));
            direct.map(Vec::as_slice).or_else(|| {
                CONTAINER_KEYS
                    .iter()
                    .filter_map(|key| map.get(*key))
                    .filter(|inner| inner.is_object())
                    .find_map(|inner| {
                        CONTAINER_KEYS
                            .iter()
                            .find_map(|key| inner.get(*key).and_then(Value::as_array))
                    })
                    .map(Vec::as_slice)
            })
        }
        _ => None,
    }
}

/// Extracts normalized records from a JSON payload.
///
/// Items are kept when their business name is non-empty after
/// normalization. Non-object items are skipped.
#[must_use]
pub fn extract_records_from_json(
    payload: &Value,
    aliases: &FieldAliases,
    region: &str,
    base: &PortalBase,
) -> Vec<InspectionRecord> {
    let Some(items) = result_items(payload) else {
        tracing::debug!(region, "JSON payload has no result container");
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| extract_item(item, aliases, region, base))
        .collect()
}

fn extract_item(
    item: &Value,
    aliases: &FieldAliases,
    region: &str,
    base: &PortalBase,
) -> Option<InspectionRecord> {
    let field = |f: Field| lookup(item, aliases.get(f));

    let business_name = normalize_business_name(&field(Field::BusinessName));
    if business_name.is_empty() {
        return None;
    }

    let license = field(Field::License);
    let establishment_type = field(Field::EstablishmentType);

    Some(InspectionRecord {
        region: region.to_owned(),
        business_name,
        address: normalize_address(&field(Field::Address)),
        inspection_date: normalize_date(&field(Field::Date)),
        violations: normalize_violations(&field(Field::Violations)),
        severity: normalize_severity(&field(Field::Severity)),
        report_link: base.absolutize(&field(Field::ReportLink)),
        license_number: (!license.is_empty()).then_some(license),
        establishment_type: (!establishment_type.is_empty()).then_some(establishment_type),
    })
}

/// First alias whose value renders to non-empty text.
fn lookup(item: &Value, keys: &[String]) -> String {
    first_match(
        keys,
        |key| item.get(key.as_str()).map(value_text).unwrap_or_default(),
        |text| !text.is_empty(),
    )
    .map(|hit| hit.value)
    .unwrap_or_default()
}

/// Renders a scalar or a list of scalars as text. Objects and nulls
/// render empty.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspdb_core::Severity;
    use serde_json::json;

    fn base() -> PortalBase {
        PortalBase::parse("https://swordsolutions.com/inspections/").unwrap()
    }

    fn extract(payload: &Value) -> Vec<InspectionRecord> {
        extract_records_from_json(payload, &FieldAliases::default(), "washtenaw", &base())
    }

    #[test]
    fn results_container_is_read() {
        let payload = json!({
            "results": [{"name": "X", "inspection_date": "2024-01-15", "risk": "low"}]
        });
        let records = extract(&payload);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.business_name, "X");
        assert_eq!(record.inspection_date, "2024-01-15");
        assert_eq!(record.severity, Severity::Low);
        assert_eq!(record.region, "washtenaw");
    }

    #[test]
    fn top_level_array_and_alternate_keys() {
        let payload = json!([
            {"facility_name": "Northside Grill", "location": "1015 Broadway St", "date": "03/02/2024"},
            {"business_name": "Jerusalem Garden", "severity": "Critical"}
        ]);
        let records = extract(&payload);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].business_name, "Northside Grill");
        assert_eq!(records[0].address, "1015 Broadway Street");
        assert_eq!(records[0].inspection_date, "2024-03-02");
        assert_eq!(records[1].severity, Severity::Critical);
    }

    #[test]
    fn data_and_records_containers() {
        let by_data = json!({"data": [{"name": "Sava's"}]});
        let by_records = json!({"total": 1, "records": [{"name": "Sava's"}]});
        assert_eq!(extract(&by_data).len(), 1);
        assert_eq!(extract(&by_records).len(), 1);
    }

    #[test]
    fn nested_container_one_level_down() {
        let payload = json!({"data": {"results": [{"name": "Mani Osteria"}]}});
        assert_eq!(extract(&payload)[0].business_name, "Mani Osteria");
    }

    #[test]
    fn missing_container_yields_nothing() {
        assert!(result_items(&json!({"error": "bad county"})).is_none());
        assert!(extract(&json!({"error": "bad county"})).is_empty());
        assert!(extract(&json!("text")).is_empty());
    }

    #[test]
    fn items_without_name_are_dropped() {
        let payload = json!({"results": [
            {"name": "  "},
            {"address": "1 Main St"},
            "not an object",
            {"name": "Kosmo"}
        ]});
        let records = extract(&payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].business_name, "Kosmo");
    }

    #[test]
    fn blank_alias_falls_through_to_next_key() {
        let payload = json!({"results": [{"name": "", "business_name": "Pizza House"}]});
        assert_eq!(extract(&payload)[0].business_name, "Pizza House");
    }

    #[test]
    fn scalar_values_render_as_text() {
        let payload = json!({"results": [{
            "name": "Cafe Zola",
            "license_number": 40211,
            "violations": ["3-501.16 Cold holding", "6-501.12 Cleaning"],
            "report_url": "/reports/40211.pdf"
        }]});
        let record = &extract(&payload)[0];
        assert_eq!(record.license_number.as_deref(), Some("40211"));
        assert_eq!(
            record.violations,
            "3-501.16 Cold holding; 6-501.12 Cleaning"
        );
        assert_eq!(
            record.report_link,
            "https://swordsolutions.com/reports/40211.pdf"
        );
        assert_eq!(record.establishment_type, None);
    }
}
