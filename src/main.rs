//! src/main.rs
//!
//! Binary entry point: parses CLI args, loads configuration, initializes
//! tracing, and runs the `App` until shutdown. Exit code 0 on a clean
//! opt-out, non-zero on startup failure.

use anyhow::Context;
use clap::Parser;
use tactoe_mesh::{App, Cli, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    if let Err(e) = App::new(cli, config)?.run().await {
        tracing::error!(error = %e, "Peer process failed");
        std::process::exit(1);
    }

    Ok(())
}
