//! Binary crate for the `weather-dashboard` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Prompting for credentials and running the interactive console
//! - Human-friendly output of rendered results

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod console;
mod output;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_logging(cmd.verbose);
    cmd.run().await
}

/// Logs go to stderr so they never mix with rendered results.
/// `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "dashboard_core=debug,weather_dashboard=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
