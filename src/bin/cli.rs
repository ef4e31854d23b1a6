//! Guardian relay CLI
//!
//! Local execution entry point. For AWS Lambda, use `guardian-relay-lambda`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use guardian_relay::{
    error::Result,
    models::{Config, SearchQuery, Settings},
    pipeline::Pipeline,
};

/// Extract articles from The Guardian and publish them to AWS SQS.
#[derive(Parser, Debug)]
#[command(name = "guardian-relay", version, about)]
struct Cli {
    /// Search query for retrieving Guardian articles
    query: String,

    /// Start date for filtering articles (format: YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date_from: Option<NaiveDate>,

    /// End date for filtering articles (format: YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date_to: Option<NaiveDate>,

    /// Maximum number of articles to relay (zero or less relays nothing)
    #[arg(
        short,
        long,
        default_value_t = SearchQuery::DEFAULT_MAX_RECORDS as i64,
        allow_negative_numbers = true
    )]
    max_records: i64,

    /// Path to the TOML file with retry, quota and API settings
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,

    /// Print the messages instead of publishing them
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}', please use YYYY-MM-DD"))
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = dotenv::dotenv() {
        log::debug!("No .env file loaded: {}", e);
    }

    let config = Config::load_or_default(&cli.config);
    let settings = Settings::from_env().inspect_err(|e| log::error!("{}", e))?;
    log::info!("Loaded configuration from {}", cli.config.display());

    let query = SearchQuery {
        query: cli.query,
        date_from: cli.date_from,
        date_to: cli.date_to,
        max_records: SearchQuery::records_limit(cli.max_records),
    };

    let pipeline = Pipeline::connect(&config, &settings).await?;

    if cli.dry_run {
        for message in pipeline.preview(&query).await? {
            println!("{}", serde_json::to_string_pretty(&message)?);
        }
        return Ok(());
    }

    let summary = pipeline.run(&query).await?;
    log::info!(
        "Transfer completed: {} of {} articles published",
        summary.published,
        summary.fetched
    );

    Ok(())
}
