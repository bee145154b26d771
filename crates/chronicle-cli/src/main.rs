mod cli;
mod commands;
mod config;
mod output;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::CliConfig::load_from_path(Some(path.into()))?,
        None => config::CliConfig::load()?,
    };
    config.apply_api_key_env();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _guard = match setup::log_dir(&config) {
        Some(log_dir) => {
            std::fs::create_dir_all(&log_dir).ok();
            let file_appender = tracing_appender::rolling::daily(log_dir, "chronicle.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_level(true)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            None
        }
    };

    let chronicle = setup::prepare_chronicle(&cli, &config)?;
    let result = commands::run(&chronicle, &cli, &config).await;
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "Command failed");
    }
    result
}
