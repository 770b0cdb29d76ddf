//! Configuration management for paralegal
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Wire format of the backend ("openai" or "raw")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Environment variable holding the pre-shared API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Batch size for embedding requests
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Retry attempts after the first failure
    #[serde(default = "default_embedding_retries")]
    pub retries: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            provider: default_provider(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key_env: default_api_key_env(),
            batch_size: default_embedding_batch_size(),
            timeout_secs: default_embedding_timeout(),
            retries: default_embedding_retries(),
        }
    }
}

impl EmbeddingConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap characters between chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default number of results
    #[serde(default = "default_query_top_k")]
    pub top_k: usize,

    /// Minimum similarity score; -1.0 applies no cutoff
    #[serde(default = "default_query_min_score")]
    pub min_score: f32,

    /// Maximum candidate chunks fetched per search
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,

    /// Character budget for assembled context (0 = unlimited)
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_query_top_k(),
            min_score: default_query_min_score(),
            scan_limit: default_scan_limit(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

/// Filesystem paths used by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for config and data
    pub base_dir: PathBuf,

    /// SQLite database file
    pub db_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base_dir = Config::default_base_dir();
        let db_file = base_dir.join("paralegal.db");
        Self { base_dir, db_file }
    }
}

impl Config {
    /// Default base directory (~/.config/paralegal or platform equivalent)
    pub fn default_base_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paralegal")
    }

    /// Default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base_dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_base_dir);
        config.paths = PathsConfig {
            db_file: base_dir.join("paralegal.db"),
            base_dir,
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.chunk.chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunk.overlap >= self.chunk.chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "chunk.overlap ({}) must be less than chunk.chunk_size ({})",
                self.chunk.overlap, self.chunk.chunk_size
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfiguration(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }
        match self.embedding.provider.as_str() {
            "openai" | "raw" => {}
            other => {
                return Err(Error::InvalidConfiguration(format!(
                    "embedding.provider '{}' is not supported; use 'openai' or 'raw'",
                    other
                )));
            }
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfiguration(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk.chunk_size, 1000);
        assert_eq!(config.chunk.overlap, 200);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.chunk.overlap = config.chunk.chunk_size;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = Config::default();
        config.embedding.provider = "duck-typed".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.embedding.model, config.embedding.model);
        assert_eq!(parsed.query.top_k, config.query.top_k);
    }
}
