use super::*;

const SAMPLE: &str = r#"{
    "_comment": "county_value must match the portal dropdown exactly",
    "washtenaw": {
        "enabled": true,
        "county_value": "MI - Washtenaw",
        "scraper_type": "sword_solutions",
        "settings": {"delay": 3, "max_pages": 10},
        "selectors": {"business_name": "td.name, td:first-child"}
    },
    "wayne": {
        "enabled": false,
        "county_value": "MI - Wayne",
        "scraper_type": "sword_solutions",
        "settings": {"delay": 2, "max_pages": 5},
        "selectors": {}
    },
    "oakland": {
        "enabled": true,
        "scraper_type": "generic"
    }
}"#;

fn keys(selection: &RegionSelection) -> Vec<&str> {
    selection.targets.iter().map(|t| t.key.as_str()).collect()
}

#[test]
fn parse_skips_comment_keys() {
    let file = parse_regions(SAMPLE).unwrap();
    assert!(!file.regions.contains_key("_comment"));
    assert_eq!(file.regions.len(), 3);
    assert!(file.invalid.is_empty());
}

#[test]
fn parse_reads_settings_and_selectors() {
    let file = parse_regions(SAMPLE).unwrap();
    let washtenaw = &file.regions["washtenaw"];
    assert_eq!(washtenaw.scraper_type, ScraperType::Portal);
    assert_eq!(washtenaw.settings.max_pages, 10);
    assert_eq!(
        washtenaw.selectors.get("business_name").map(String::as_str),
        Some("td.name, td:first-child")
    );
}

#[test]
fn parse_applies_defaults_for_missing_settings() {
    let file = parse_regions(SAMPLE).unwrap();
    let oakland = &file.regions["oakland"];
    assert_eq!(oakland.settings, RegionSettings::default());
    assert_eq!(oakland.scraper_type, ScraperType::Legacy);
}

#[test]
fn parse_accepts_strategy_aliases() {
    let file = parse_regions(
        r#"{"a": {"county_value": "X", "scraper_type": "portal"},
            "b": {"county_value": "Y", "scraper_type": "legacy"}}"#,
    )
    .unwrap();
    assert_eq!(file.regions["a"].scraper_type, ScraperType::Portal);
    assert_eq!(file.regions["b"].scraper_type, ScraperType::Legacy);
}

#[test]
fn parse_keeps_malformed_entry_aside() {
    let file = parse_regions(
        r#"{"good": {"county_value": "MI - Good"},
            "bad": {"county_value": "MI - Bad", "scraper_type": "selenium"}}"#,
    )
    .unwrap();
    assert!(file.regions.contains_key("good"));
    assert!(file.invalid.contains_key("bad"));
}

#[test]
fn parse_rejects_non_object_root() {
    let result = parse_regions("[1, 2, 3]");
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn parse_rejects_invalid_json() {
    let result = parse_regions("{not json");
    assert!(matches!(result, Err(ConfigError::RegionsFileParse(_))));
}

#[test]
fn full_run_excludes_disabled_regions() {
    let file = parse_regions(SAMPLE).unwrap();
    let selection = select_regions(&file, None);
    assert_eq!(keys(&selection), vec!["washtenaw"]);
}

#[test]
fn full_run_reports_missing_search_value_without_blocking_others() {
    let file = parse_regions(SAMPLE).unwrap();
    let selection = select_regions(&file, None);
    assert_eq!(selection.errors.len(), 1);
    let (key, err) = &selection.errors[0];
    assert_eq!(key, "oakland");
    assert!(matches!(err, ConfigError::MissingSearchValue(k) if k == "oakland"));
}

#[test]
fn named_region_is_selected_even_when_disabled() {
    let file = parse_regions(SAMPLE).unwrap();
    let selection = select_regions(&file, Some("wayne"));
    assert_eq!(keys(&selection), vec!["wayne"]);
    assert!(selection.errors.is_empty());
    assert_eq!(selection.targets[0].search_value, "MI - Wayne");
    assert_eq!(selection.targets[0].max_pages, 5);
}

#[test]
fn named_region_matches_case_insensitively() {
    let file = parse_regions(SAMPLE).unwrap();
    let selection = select_regions(&file, Some("Washtenaw"));
    assert_eq!(keys(&selection), vec!["washtenaw"]);
}

#[test]
fn unknown_named_region_is_a_config_error() {
    let file = parse_regions(SAMPLE).unwrap();
    let selection = select_regions(&file, Some("macomb"));
    assert!(selection.targets.is_empty());
    assert!(matches!(
        &selection.errors[0].1,
        ConfigError::UnknownRegion(name) if name == "macomb"
    ));
}

#[test]
fn blank_county_value_is_rejected() {
    let region = RegionConfig {
        enabled: true,
        county_value: Some("   ".to_string()),
        scraper_type: ScraperType::Portal,
        settings: RegionSettings::default(),
        selectors: BTreeMap::new(),
        url: None,
        form_fields: BTreeMap::new(),
    };
    assert!(matches!(
        region.to_target("blank"),
        Err(ConfigError::MissingSearchValue(_))
    ));
}

#[test]
fn scraper_type_display_matches_config_tag() {
    assert_eq!(ScraperType::Portal.to_string(), "sword_solutions");
    assert_eq!(ScraperType::Legacy.to_string(), "generic");
}

#[test]
fn shipped_regions_file_is_valid() {
    let file = parse_regions(include_str!("../../../config/regions.json")).expect("parse");
    assert!(file.invalid.is_empty(), "{:?}", file.invalid);

    let selection = select_regions(&file, None);
    assert!(selection.errors.is_empty());
    assert!(selection.targets.iter().all(|t| !t.search_value.is_empty()));

    let legacy = select_regions(&file, Some("shiawassee"));
    assert_eq!(legacy.targets[0].scraper_type, ScraperType::Legacy);
}
