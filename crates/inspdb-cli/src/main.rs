mod analyze;
mod scrape;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "inspdb-cli")]
#[command(about = "Scrape restaurant health inspections from county portals")]
struct Cli {
    /// Scrape only this region, even if it is disabled in the config.
    #[arg(long, value_name = "REGION")]
    county: Option<String>,

    /// One page per region, short delay, timestamped output file.
    #[arg(long)]
    test: bool,

    /// Print what the portal landing page looks like and exit.
    #[arg(long, conflicts_with = "test")]
    analyze: bool,

    /// Save each record's inspection report under `<output-dir>/reports`.
    #[arg(long, conflicts_with = "analyze")]
    download_reports: bool,

    /// Regions file; overrides `INSPDB_REGIONS_PATH`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output directory; overrides `INSPDB_OUTPUT_DIR`.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = inspdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Some(path) = cli.config {
        config.regions_path = path;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let client = inspdb_scraper::PortalClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_secs,
    )?;

    if cli.analyze {
        return analyze::run(&config, &client, cli.county.as_deref()).await;
    }

    scrape::run(
        &config,
        &client,
        &scrape::Args {
            county: cli.county,
            test: cli.test,
            download_reports: cli.download_reports,
        },
    )
    .await
}
