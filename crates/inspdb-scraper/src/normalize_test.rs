use super::*;

// -----------------------------------------------------------------------
// normalize_date
// -----------------------------------------------------------------------

#[test]
fn date_month_first_slash() {
    assert_eq!(normalize_date("01/15/2024"), "2024-01-15");
}

#[test]
fn date_month_first_dash_and_dot() {
    assert_eq!(normalize_date("01-15-2024"), "2024-01-15");
    assert_eq!(normalize_date("01.15.2024"), "2024-01-15");
}

#[test]
fn date_day_first_when_month_first_is_impossible() {
    assert_eq!(normalize_date("15/01/2024"), "2024-01-15");
    assert_eq!(normalize_date("15.01.2024"), "2024-01-15");
}

#[test]
fn date_ambiguous_prefers_month_first() {
    assert_eq!(normalize_date("03/04/2024"), "2024-03-04");
}

#[test]
fn date_long_and_short_month_names() {
    assert_eq!(normalize_date("January 15, 2024"), "2024-01-15");
    assert_eq!(normalize_date("Jan 15, 2024"), "2024-01-15");
}

#[test]
fn date_two_digit_year() {
    assert_eq!(normalize_date("01/15/24"), "2024-01-15");
    assert_eq!(normalize_date("12-31-99"), "1999-12-31");
}

#[test]
fn date_single_digit_month_and_day() {
    assert_eq!(normalize_date("3/7/2023"), "2023-03-07");
}

#[test]
fn date_timestamps_keep_only_date() {
    assert_eq!(normalize_date("2024-01-15T13:45:00"), "2024-01-15");
    assert_eq!(normalize_date("2024-01-15T13:45:00Z"), "2024-01-15");
    assert_eq!(normalize_date("01/15/2024 01:45:00 PM"), "2024-01-15");
}

#[test]
fn date_surrounding_whitespace_is_ignored() {
    assert_eq!(normalize_date("  01/15/2024\n"), "2024-01-15");
}

#[test]
fn date_unparseable_input_is_returned_trimmed() {
    assert_eq!(normalize_date("  pending review "), "pending review");
    assert_eq!(normalize_date("13/45/2024"), "13/45/2024");
}

#[test]
fn date_empty_input_stays_empty() {
    assert_eq!(normalize_date(""), "");
    assert_eq!(normalize_date("   "), "");
}

#[test]
fn date_iso_input_is_a_fixed_point() {
    for raw in ["01/15/2024", "Jan 15, 2024", "15-01-2024", "not a date"] {
        let once = normalize_date(raw);
        assert_eq!(normalize_date(&once), once, "not idempotent for {raw:?}");
    }
}

// -----------------------------------------------------------------------
// normalize_severity
// -----------------------------------------------------------------------

#[test]
fn severity_critical_keywords() {
    for raw in ["CRITICAL", "High", "severe violation", "Red placard", "Priority (crit)"] {
        assert_eq!(normalize_severity(raw), Severity::Critical, "{raw:?}");
    }
}

#[test]
fn severity_low_keywords() {
    for raw in ["low", "Minor", "ROUTINE", "green"] {
        assert_eq!(normalize_severity(raw), Severity::Low, "{raw:?}");
    }
}

#[test]
fn severity_defaults_to_medium() {
    for raw in ["", "   ", "moderate", "core item", "n/a"] {
        assert_eq!(normalize_severity(raw), Severity::Medium, "{raw:?}");
    }
}

#[test]
fn severity_critical_wins_over_low() {
    assert_eq!(normalize_severity("high (was low)"), Severity::Critical);
}

#[test]
fn severity_of_its_own_label_is_stable() {
    for severity in [Severity::Low, Severity::Medium, Severity::Critical] {
        assert_eq!(normalize_severity(severity.as_str()), severity);
    }
}

// -----------------------------------------------------------------------
// names and addresses
// -----------------------------------------------------------------------

#[test]
fn business_name_collapses_whitespace_and_trailing_punctuation() {
    assert_eq!(
        normalize_business_name("  Blue   Tractor\tBBQ ,; "),
        "Blue Tractor BBQ"
    );
}

#[test]
fn business_name_keeps_inner_punctuation() {
    assert_eq!(normalize_business_name("Zingerman's, Inc."), "Zingerman's, Inc.");
}

#[test]
fn address_expands_abbreviations() {
    assert_eq!(
        normalize_address("422 Detroit St., Ann Arbor"),
        "422 Detroit Street, Ann Arbor"
    );
    assert_eq!(normalize_address("10 Oak ave"), "10 Oak Avenue");
    assert_eq!(normalize_address("5 Elm Blvd;"), "5 Elm Boulevard");
    assert_eq!(normalize_address("7 Pine Ln"), "7 Pine Lane");
}

#[test]
fn address_only_expands_whole_words() {
    assert_eq!(normalize_address("1st Stadium Rdx"), "1st Stadium Rdx");
    assert_eq!(normalize_address("Drake Ct"), "Drake Court");
}

#[test]
fn address_normalization_is_idempotent() {
    let once = normalize_address("  300   Packard  Rd. ");
    assert_eq!(once, "300 Packard Road");
    assert_eq!(normalize_address(&once), once);
}

#[test]
fn violations_collapse_whitespace() {
    assert_eq!(
        normalize_violations(" 3-501.16\n  Cold holding \t "),
        "3-501.16 Cold holding"
    );
}

// -----------------------------------------------------------------------
// normalize_record
// -----------------------------------------------------------------------

fn raw_record() -> InspectionRecord {
    InspectionRecord {
        region: "washtenaw".to_string(),
        business_name: " Frita   Batidos, ".to_string(),
        address: "117 W Washington St".to_string(),
        inspection_date: "2/9/2024".to_string(),
        violations: "None\n observed".to_string(),
        severity: Severity::Low,
        report_link: "https://swordsolutions.com/inspections/report/1".to_string(),
        license_number: Some("FL-0001".to_string()),
        establishment_type: None,
    }
}

#[test]
fn record_fields_are_normalized() {
    let record = normalize_record(raw_record());
    assert_eq!(record.business_name, "Frita Batidos");
    assert_eq!(record.address, "117 W Washington Street");
    assert_eq!(record.inspection_date, "2024-02-09");
    assert_eq!(record.violations, "None observed");
    assert_eq!(record.license_number.as_deref(), Some("FL-0001"));
}

#[test]
fn record_normalization_is_idempotent() {
    let once = normalize_record(raw_record());
    let twice = normalize_record(once.clone());
    assert_eq!(once, twice);
}
