//! Error taxonomy for paralegal
//!
//! One `thiserror` enum plus a `Result<T>` alias. Infrastructure errors are
//! folded in via `#[from]`; domain conditions get typed variants.

use thiserror::Error;

/// Main error type for paralegal operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding dimension mismatch for collection '{collection}': expected {expected}, got {got}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        got: usize,
    },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Not initialized: run 'paralegal init' first")]
    NotInitialized,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Result type alias for paralegal
pub type Result<T> = std::result::Result<T, Error>;
