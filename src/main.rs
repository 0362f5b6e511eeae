use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

use container_vulns::api::ConsoleClient;
use container_vulns::config::Config;
use container_vulns::{logging, output, report};

const DEFAULT_FILE_NAME: &str = "container_vulns.csv";

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (commit: ", env!("GIT_HASH"), ")");

/// Export container image vulnerabilities from a Compute console to CSV
#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Output CSV file name
    #[arg(short, long, default_value = DEFAULT_FILE_NAME)]
    filename: PathBuf,

    /// Include container ids next to container names as name(id)
    #[arg(short, long)]
    include_id: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init(&args.log_level);

    if let Err(e) = run(args).await {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    info!("Starting container vulnerability export");
    info!("Console: {}", config.console_url);
    info!("Output file: {}", args.filename.display());

    let mut client = ConsoleClient::new(&config).context("Failed to create console client")?;
    client
        .authenticate(&config.console_username, &config.console_password)
        .await
        .context("Failed to authenticate with console")?;

    info!("Testing console API access");
    let started = Instant::now();
    client
        .ping()
        .await
        .context("Console connectivity check failed")?;
    info!("Console reachable (elapsed: {:.2?})", started.elapsed());

    let started = Instant::now();
    info!("Fetching hosts (please wait)");
    let hosts = client.list_hosts().await.context("Failed to fetch hosts")?;
    info!(
        "Fetched {} hosts (elapsed: {:.2?})",
        hosts.len(),
        started.elapsed()
    );

    let started = Instant::now();
    info!("Fetching deployed base images (please wait)");
    let images = client
        .list_images()
        .await
        .context("Failed to fetch images")?;
    info!(
        "Fetched {} images (elapsed: {:.2?})",
        images.len(),
        started.elapsed()
    );

    let started = Instant::now();
    info!("Fetching containers (please wait)");
    let containers = client
        .list_containers()
        .await
        .context("Failed to fetch containers")?;
    info!(
        "Fetched {} containers (elapsed: {:.2?})",
        containers.len(),
        started.elapsed()
    );

    let started = Instant::now();
    let report = report::build_report(&hosts, &images, &containers, args.include_id);
    info!(
        "Materialized {} report rows (elapsed: {:.2?})",
        report.rows.len(),
        started.elapsed()
    );

    let started = Instant::now();
    output::write_csv(&args.filename, &report).context("Failed to write CSV report")?;
    info!(
        "Export complete: {} (elapsed: {:.2?})",
        args.filename.display(),
        started.elapsed()
    );

    Ok(())
}
