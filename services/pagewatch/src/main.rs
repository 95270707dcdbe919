//! Pagewatch CLI
//!
//! Command-line interface for the web page change monitor.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pagewatch::interval::parse_interval;
use pagewatch::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "pagewatch")]
#[command(about = "Watch a web page element and send email when it changes")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page to watch (overrides config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Id of the element to watch (overrides config file)
    #[arg(short, long)]
    element_id: Option<String>,

    /// Poll interval: seconds, or a shorthand such as 1m, 30m, 4h, 1w (overrides config file)
    #[arg(short, long, value_parser = parse_interval_arg)]
    interval: Option<Duration>,

    /// Request timeout in seconds (overrides config file)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Keyword to look for; repeat for several (replaces config file keywords)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

fn parse_interval_arg(input: &str) -> Result<Duration, String> {
    parse_interval(input).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, url={:?}, interval={:?}, log_level={:?}",
        args.config,
        args.url,
        args.interval,
        args.log_level
    );

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => return Err(e.into()),
    }

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(url) = args.url {
        config.target.url = url;
    }
    if let Some(element_id) = args.element_id {
        config.target.element_id = element_id;
    }
    if let Some(interval) = args.interval {
        config.target.polling_interval_seconds = interval.as_secs();
    }
    if let Some(timeout) = args.timeout {
        config.target.request_timeout_seconds = timeout;
    }
    if !args.keywords.is_empty() {
        config.keywords = args.keywords;
    }

    config.resolve_secrets()?;

    tracing::info!("Starting the website monitor for {}", config.target.url);
    tracing::debug!(
        "Element: '{}', interval: {}s, keywords: {:?}",
        config.target.element_id,
        config.target.polling_interval_seconds,
        config.keywords
    );

    pagewatch::run(config).await?;

    Ok(())
}
