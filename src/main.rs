//! Dashforge: e-commerce analytics dashboard over pre-aggregated CSV summaries
//!
//! This is the main entrypoint that orchestrates data loading, filtering and
//! rendering of the dashboard sections.

use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use dashforge::cli::OutputFormat;
use dashforge::filter::{date_bounds, distinct_categories, distinct_regions};
use dashforge::{build_report, load_prepared_data, Args, Result};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter directive
const LOG_ENV: &str = "DASHFORGE_LOG";

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.list_options {
        run_list_options(&args)
    } else {
        run_dashboard(&args)
    }
}

/// Initialize tracing from `DASHFORGE_LOG`, falling back to `info` (`debug` when verbose).
///
/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Print the values the filters accept
fn run_list_options(args: &Args) -> Result<()> {
    let data = load_prepared_data(&args.data_paths())?;
    let Some(orders) = data.orders.as_ref() else {
        println!("Combined order data is not available; no filter options.");
        return Ok(());
    };

    match date_bounds(orders)? {
        Some((first, last)) => println!("Date range: {first} to {last}"),
        None => println!("Date range: no purchase dates"),
    }
    println!("States: {}", distinct_regions(orders)?.join(", "));
    println!("Categories: {}", distinct_categories(orders)?.join(", "));

    Ok(())
}

/// Load, filter and render every dashboard section
fn run_dashboard(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let paths = args.data_paths();
    debug!(?paths, "loading dashboard data");
    let data = load_prepared_data(&paths)?;
    info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "data loaded");

    let options = args.dashboard_options();
    let report = build_report(&data, &options)?;

    match args.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
            println!("{json}");
        }
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "dashboard rendered"
    );
    Ok(())
}
