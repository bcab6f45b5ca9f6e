// Main entry point for SoundWave
// Parses the command line, sets up logging, and hands off to the CLI

mod cli;
mod config;
mod library;
mod player;
mod server;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Args;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("soundwave=info,tower_http=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env().context("reading configuration")?;

    cli::run(args, config).await
}
