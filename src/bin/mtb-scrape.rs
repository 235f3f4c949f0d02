use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use mtb_scraper::client::BASE_URL;
use mtb_scraper::{HarvestOptions, Harvester, JsonFileSink, MtbClient, PairingPolicy};
use tracing::error;

/// Scrape UCI MTB World Series events, races and results into a local folder.
#[derive(Parser)]
#[command(name = "mtb-scrape", version)]
struct Cli {
    /// Event year to scrape
    year: i32,

    /// Output folder for the scraped data
    #[arg(short, long, default_value = "./data")]
    output: PathBuf,

    /// Site to scrape
    #[arg(long, default_value = BASE_URL)]
    base_url: String,

    /// Pair race headings with result links even when their counts differ
    #[arg(long)]
    best_effort: bool,

    /// Re-fetch races whose results file already exists
    #[arg(long)]
    overwrite: bool,

    /// Pause between requests, in milliseconds
    #[arg(long, default_value = "100")]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let options = HarvestOptions {
        base_url: cli.base_url.clone(),
        pairing: if cli.best_effort {
            PairingPolicy::BestEffort
        } else {
            PairingPolicy::Strict
        },
        overwrite: cli.overwrite,
        request_delay: Duration::from_millis(cli.delay_ms),
    };
    let client = MtbClient::new().with_base_url(cli.base_url);
    let harvester = Harvester::new(client, JsonFileSink::new(cli.output), options);

    match harvester.run(cli.year).await {
        Ok(summary) => {
            println!(
                "Done: {} events ({} invalid), {} races written ({} skipped, {} failed).",
                summary.events,
                summary.events_failed,
                summary.races_written,
                summary.races_skipped,
                summary.races_failed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "harvest failed");
            ExitCode::FAILURE
        }
    }
}
