pub mod app_config;
pub mod config;
pub mod export;
pub mod records;
pub mod regions;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use export::{
    load_records, test_output_filename, write_csv, write_csv_to, write_json, ExportError,
};
pub use records::{InspectionRecord, Severity};
pub use regions::{
    load_regions, parse_regions, select_regions, RegionConfig, RegionSelection, RegionSettings, RegionTarget,
    RegionsFile, ScraperType,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read regions file {path}: {source}")]
    RegionsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse regions file: {0}")]
    RegionsFileParse(#[source] serde_json::Error),

    #[error("unknown region: '{0}'")]
    UnknownRegion(String),

    #[error("region '{0}' has no county_value configured")]
    MissingSearchValue(String),

    #[error("config validation error: {0}")]
    Validation(String),
}
