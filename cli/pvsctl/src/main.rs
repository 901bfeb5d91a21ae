//! pvsctl (pvs-preflight) - pre-flight checks for Power VS installs
//!
//! Verifies, before any machine is created, that the target workspace has
//! the processor and memory headroom for the requested control-plane and
//! worker shapes, and that the planned machine networks fit the existing
//! cloud connection topology.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod output;
mod plan;
mod session;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::from_env()?;

    // Prefer RUST_LOG, fall back to PVS_LOG_LEVEL. Logs go to stderr so
    // JSON output on stdout stays parseable.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if let Err(e) = cli.run(config).await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
