use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_PORTAL_URL: &str = "https://swordsolutions.com/inspections/";

/// Desktop browser identification. Some portal deployments reject requests
/// carrying a library default `User-Agent`.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("INSPDB_ENV", "development"))?;

    let bind_raw = or_default("INSPDB_BIND_ADDR", "0.0.0.0:5000");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "INSPDB_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let log_level = or_default("INSPDB_LOG_LEVEL", "info");
    let regions_path = PathBuf::from(or_default("INSPDB_REGIONS_PATH", "./config/regions.json"));
    let output_dir = PathBuf::from(or_default("INSPDB_OUTPUT_DIR", "./outputs"));

    let portal_url = or_default("INSPDB_PORTAL_URL", DEFAULT_PORTAL_URL);
    if !(portal_url.starts_with("http://") || portal_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "INSPDB_PORTAL_URL".to_string(),
            reason: format!("expected an http(s) URL, got \"{portal_url}\""),
        });
    }

    let request_timeout_secs = parse_u64("INSPDB_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("INSPDB_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_u32("INSPDB_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("INSPDB_RETRY_BACKOFF_BASE_SECS", "2")?;
    let scrape_cron = optional("INSPDB_SCRAPE_CRON");
    let api_keys = optional("INSPDB_API_KEYS");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        regions_path,
        output_dir,
        portal_url,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        scrape_cron,
        api_keys,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "INSPDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}
