//! Registry client - Main entry point

use anyhow::Result;
use clap::Parser;
use ter_client::{cli::Args, commands, config::Config, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::debug!("Starting ter-client v{}", env!("CARGO_PKG_VERSION"));

    commands::run(args.command, &config).await?;

    Ok(())
}
