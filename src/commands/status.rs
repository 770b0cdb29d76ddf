//! Status command - system overview

use crate::config::Config;
use crate::error::Result;
use crate::store::{CollectionInfo, VectorStore};
use serde::Serialize;

/// System status report
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub initialized: bool,
    pub db_file: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub backend_url: String,
    pub collections: Vec<CollectionInfo>,
}

/// Gather system status
pub async fn cmd_status(config: &Config, store: &VectorStore) -> Result<StatusReport> {
    let initialized = store.is_initialized().await?;
    let collections = if initialized {
        store.list_collections().await?
    } else {
        Vec::new()
    };

    Ok(StatusReport {
        initialized,
        db_file: config.paths.db_file.display().to_string(),
        embedding_model: config.embedding.model.clone(),
        embedding_dimension: config.embedding.dimension,
        backend_url: config.embedding.backend_url.clone(),
        collections,
    })
}

/// Print a status report to the console
pub fn print_status(status: &StatusReport) {
    println!("\nparalegal status\n");
    println!("Database: {}", status.db_file);
    println!(
        "Embedding: {} (dimension {}) via {}",
        status.embedding_model, status.embedding_dimension, status.backend_url
    );

    if !status.initialized {
        println!("\nNot initialized. Run 'paralegal init' first.");
        return;
    }

    if status.collections.is_empty() {
        println!("\nNo collections yet. Ingest a document to create one.");
        return;
    }

    println!("\nCollections:");
    for info in &status.collections {
        println!(
            "  {} — {} chunks, {} documents, dimension {}",
            info.tag, info.chunks, info.documents, info.dimension
        );
    }
}
