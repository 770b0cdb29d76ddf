//! Init command - write default config and create the database

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::VectorStore;
use std::path::PathBuf;
use tracing::info;

/// Initialize the base directory, default config, and database schema
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let base_dir = base_dir.unwrap_or_else(Config::default_base_dir);
    let config_path = base_dir.join("config.toml");

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}; use --force to overwrite",
            config_path.display()
        )));
    }

    std::fs::create_dir_all(&base_dir)?;

    let mut config = Config::default();
    config.paths.base_dir = base_dir.clone();
    config.paths.db_file = base_dir.join("paralegal.db");
    config.save(&config_path)?;

    let store = VectorStore::connect(&config.paths.db_file).await?;
    store.init_schema().await?;

    info!(path = %config_path.display(), "Initialized configuration");
    Ok(config_path)
}
