pub mod client;
pub mod detect;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod normalize;
pub mod origin;
pub mod pagination;
pub(crate) mod rate_limit;
pub mod reports;
pub mod run;
pub mod scrape;

pub use client::{FormData, PortalClient, PortalResponse};
pub use detect::{analyze_landing_page, detect, FormMethod, PaginationHint, RegionOption, SiteStructure};
pub use error::ScraperError;
pub use extract::{extract_records, extract_records_from_json, FieldAliases, FieldSelectors};
pub use normalize::{
    normalize_address, normalize_business_name, normalize_date, normalize_record,
    normalize_severity,
};
pub use origin::PortalBase;
pub use reports::{download_reports, report_filename, DownloadSummary};
pub use run::{run_regions, RegionReport, RegionStatus, RunReport};
pub use scrape::{scrape_region, RegionOutcome, ScrapeOptions, ScrapeStats, MAX_PAGES_CEILING};
