//! `weather` binary: stores the OpenWeather key and prints the current
//! temperature plus a 7-day forecast, served from a local file cache when fresh.
//!
//! Set `RUST_LOG=weather_core=debug` to see cache hits and provider calls.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
