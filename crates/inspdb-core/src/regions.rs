//! Per-region scrape configuration loaded from `config/regions.json`.
//!
//! The file is a JSON object keyed by region. Keys beginning with `_` are
//! comments and skipped. An entry that fails to deserialize does not poison
//! the file: it is kept aside in [`RegionsFile::invalid`] and surfaces as a
//! configuration error only for that region.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which extraction strategy drives a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScraperType {
    /// The vendor portal: structure detection, JSON endpoint discovery, HTML form fallback.
    #[default]
    #[serde(rename = "sword_solutions", alias = "portal")]
    Portal,
    /// The older server-rendered search page driven by GET + next links.
    #[serde(rename = "generic", alias = "legacy")]
    Legacy,
}

impl std::fmt::Display for ScraperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScraperType::Portal => write!(f, "sword_solutions"),
            ScraperType::Legacy => write!(f, "generic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSettings {
    /// Seconds to pause between page requests.
    #[serde(default = "default_delay")]
    pub delay: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            delay: default_delay(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_delay() -> u64 {
    3
}

fn default_max_pages() -> u32 {
    10
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Exact dropdown token the portal expects, e.g. `"MI - Washtenaw"`.
    #[serde(default)]
    pub county_value: Option<String>,
    #[serde(default)]
    pub scraper_type: ScraperType,
    #[serde(default)]
    pub settings: RegionSettings,
    /// Per-field selector overrides. Values may hold comma-separated
    /// alternatives tried in order.
    #[serde(default)]
    pub selectors: BTreeMap<String, String>,
    /// Landing page override; defaults to the process-wide portal URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Static form values merged into every search payload.
    #[serde(default)]
    pub form_fields: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct RegionsFile {
    pub regions: BTreeMap<String, RegionConfig>,
    /// Entries that were present but malformed, with the parse error text.
    pub invalid: BTreeMap<String, String>,
}

/// A region that passed validation and is ready to scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTarget {
    pub key: String,
    pub search_value: String,
    pub scraper_type: ScraperType,
    pub delay_secs: u64,
    pub max_pages: u32,
    pub selectors: BTreeMap<String, String>,
    pub url: Option<String>,
    pub form_fields: BTreeMap<String, String>,
}

/// Result of resolving which regions a run covers.
#[derive(Debug, Default)]
pub struct RegionSelection {
    pub targets: Vec<RegionTarget>,
    pub errors: Vec<(String, ConfigError)>,
}

/// Load the regions configuration from a JSON file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or is not a JSON object.
pub fn load_regions(path: &Path) -> Result<RegionsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegionsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_regions(&content)
}

/// Parse regions configuration text.
///
/// # Errors
///
/// Returns [`ConfigError::RegionsFileParse`] if the text is not valid JSON,
/// or [`ConfigError::Validation`] if the top level is not an object.
pub fn parse_regions(content: &str) -> Result<RegionsFile, ConfigError> {
    let root: serde_json::Value =
        serde_json::from_str(content).map_err(ConfigError::RegionsFileParse)?;
    let serde_json::Value::Object(entries) = root else {
        return Err(ConfigError::Validation(
            "regions file must be a JSON object keyed by region".to_string(),
        ));
    };

    let mut file = RegionsFile::default();
    for (key, value) in entries {
        if key.starts_with('_') {
            continue;
        }
        match serde_json::from_value::<RegionConfig>(value) {
            Ok(region) => {
                file.regions.insert(key, region);
            }
            Err(e) => {
                file.invalid.insert(key, e.to_string());
            }
        }
    }
    Ok(file)
}

/// Resolve the regions a run should cover.
///
/// With no filter every enabled region is selected. A named region is
/// selected even when disabled; the name matches case-insensitively.
/// Problems are collected per region so a bad entry never blocks the rest.
#[must_use]
pub fn select_regions(file: &RegionsFile, filter: Option<&str>) -> RegionSelection {
    let mut selection = RegionSelection::default();

    if let Some(name) = filter {
        let wanted = name.trim().to_lowercase();
        let found = file
            .regions
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted);
        if let Some((key, region)) = found {
            push_target(&mut selection, key, region);
        } else if let Some((key, reason)) = file
            .invalid
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
        {
            selection.errors.push((
                key.clone(),
                ConfigError::Validation(format!("region '{key}' is malformed: {reason}")),
            ));
        } else {
            selection
                .errors
                .push((name.to_string(), ConfigError::UnknownRegion(name.to_string())));
        }
        return selection;
    }

    for (key, region) in &file.regions {
        if region.enabled {
            push_target(&mut selection, key, region);
        }
    }
    for (key, reason) in &file.invalid {
        selection.errors.push((
            key.clone(),
            ConfigError::Validation(format!("region '{key}' is malformed: {reason}")),
        ));
    }
    selection
}

fn push_target(selection: &mut RegionSelection, key: &str, region: &RegionConfig) {
    match region.to_target(key) {
        Ok(target) => selection.targets.push(target),
        Err(e) => selection.errors.push((key.to_string(), e)),
    }
}

impl RegionConfig {
    /// Validate this entry and turn it into a [`RegionTarget`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSearchValue`] when `county_value` is
    /// absent or blank.
    pub fn to_target(&self, key: &str) -> Result<RegionTarget, ConfigError> {
        let search_value = self
            .county_value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingSearchValue(key.to_string()))?;

        Ok(RegionTarget {
            key: key.to_string(),
            search_value: search_value.to_string(),
            scraper_type: self.scraper_type,
            delay_secs: self.settings.delay,
            max_pages: self.settings.max_pages,
            selectors: self.selectors.clone(),
            url: self.url.clone().filter(|u| !u.trim().is_empty()),
            form_fields: self.form_fields.clone(),
        })
    }
}

#[cfg(test)]
#[path = "regions_test.rs"]
mod tests;
