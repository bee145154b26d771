use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chronicle_ai::DefaultLlmClientFactory;
use chronicle_core::{Chronicle, EngineConfig};

use crate::cli::Cli;
use crate::config::CliConfig;

const DB_FILE: &str = "chronicle.db";

/// `--db-path`, then the config file, then `<data dir>/chronicle/chronicle.db`.
pub fn resolve_db_path(cli: &Cli, config: &CliConfig) -> Result<PathBuf> {
    if let Some(path) = cli.db_path.as_ref().or(config.default.db_path.as_ref()) {
        return Ok(PathBuf::from(path));
    }
    let data_dir = dirs::data_dir()
        .context("Could not determine a data directory; pass --db-path")?
        .join("chronicle");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    Ok(data_dir.join(DB_FILE))
}

pub fn log_dir(config: &CliConfig) -> Option<PathBuf> {
    config.default.log_dir.as_ref().map(PathBuf::from)
}

pub fn prepare_chronicle(cli: &Cli, config: &CliConfig) -> Result<Chronicle> {
    let db_path = resolve_db_path(cli, config)?;
    tracing::debug!(path = %db_path.display(), "Opening database");
    Chronicle::open(
        &db_path,
        Arc::new(DefaultLlmClientFactory::new()),
        EngineConfig::default(),
    )
}
