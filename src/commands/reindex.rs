//! Reindex command - rebuild a collection from its registered documents
//!
//! Deletes all existing chunks for the tag (clearing the dimension ledger),
//! re-extracts text for every registered document, and re-runs indexing.
//! A single document's failure never aborts the run; failures are tallied
//! and logged per document id.

use crate::commands::ingest::cmd_index_document;
use crate::config::Config;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::extract::extract_text;
use crate::progress::add_progress_bar;
use crate::store::VectorStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Reindex statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReindexStats {
    /// Documents considered
    pub documents: usize,
    /// Chunks stored across all successfully processed documents
    pub indexed: usize,
    /// Documents skipped (no stored path to re-extract from)
    pub skipped: usize,
    /// Documents that failed extraction or indexing
    pub errors: usize,
}

/// Rebuild a collection's vectors from source documents.
///
/// This is a maintenance operation: it clears the collection first, so a
/// provider or dimension change takes effect without silent coercion.
pub async fn cmd_reindex(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    collection: &str,
) -> Result<ReindexStats> {
    info!(collection = collection, "Starting reindex");

    let documents = store.list_documents(collection).await?;
    let removed = store.reset_collection(collection).await?;
    info!(removed = removed, "Cleared existing chunks");

    let mut stats = ReindexStats {
        documents: documents.len(),
        ..Default::default()
    };

    let bar = add_progress_bar(documents.len() as u64, "Reindexing documents");

    for doc in documents {
        let Some(stored_path) = doc.stored_path.as_deref() else {
            warn!(doc_id = %doc.id, "Skipping document without a stored path");
            stats.skipped += 1;
            bar.inc(1);
            continue;
        };

        match reindex_document(config, store, embedder, collection, &doc, stored_path).await {
            Ok(chunks_stored) => {
                stats.indexed += chunks_stored;
            }
            Err(e) => {
                warn!(doc_id = %doc.id, error = %e, "Failed to reindex document");
                stats.errors += 1;
            }
        }
        bar.inc(1);
    }

    bar.finish_and_clear();

    info!(
        documents = stats.documents,
        indexed = stats.indexed,
        skipped = stats.skipped,
        errors = stats.errors,
        "Reindex complete"
    );

    Ok(stats)
}

async fn reindex_document(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    collection: &str,
    doc: &crate::store::DocumentRecord,
    stored_path: &str,
) -> Result<usize> {
    let text = extract_text(Path::new(stored_path)).map_err(|e| match e {
        Error::UnsupportedFormat(_) => e,
        Error::Extraction(_) => e,
        other => Error::Extraction(other.to_string()),
    })?;

    let summary = cmd_index_document(
        config,
        store,
        embedder,
        &text,
        &doc.id,
        collection,
        doc.owner_id.as_deref(),
        doc.conversation_id.as_deref(),
    )
    .await?;

    Ok(summary.chunks_stored)
}

/// Print reindex stats to the console
pub fn print_reindex_stats(stats: &ReindexStats) {
    println!("\n🔄 Reindex Complete\n");
    println!("Documents considered: {}", stats.documents);
    println!("Chunks indexed: {}", stats.indexed);
    if stats.skipped > 0 {
        println!("Skipped (no stored path): {}", stats.skipped);
    }
    if stats.errors > 0 {
        println!("Errors: {}", stats.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_store, StubEmbedder};
    use crate::commands::cmd_ingest_file;
    use tempfile::TempDir;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.chunk.chunk_size = 50;
        config.chunk.overlap = 10;
        config
    }

    #[tokio::test]
    async fn test_reindex_continues_past_unreadable_document() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        let upload_dir = TempDir::new().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            let path = upload_dir.path().join(name);
            std::fs::write(&path, format!("Contents of {} for indexing.", name)).unwrap();
            cmd_ingest_file(
                &config, &store, &embedder, &path, "global", None, None, None,
            )
            .await
            .unwrap();
        }

        // Break one source file, then rebuild
        std::fs::remove_file(upload_dir.path().join("b.txt")).unwrap();

        let stats = cmd_reindex(&config, &store, &embedder, "global")
            .await
            .unwrap();

        assert_eq!(stats.documents, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.indexed, 2);
        assert_eq!(store.count_chunks("global").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reindex_resets_dimension() {
        let (_dir, store) = test_store().await;
        let config = test_config();

        let upload_dir = TempDir::new().unwrap();
        let path = upload_dir.path().join("terms.txt");
        std::fs::write(&path, "Some binding terms.").unwrap();

        let embedder_v1 = StubEmbedder::new(4);
        cmd_ingest_file(
            &config, &store, &embedder_v1, &path, "global", None, None, None,
        )
        .await
        .unwrap();
        assert_eq!(store.collection_dimension("global").await.unwrap(), Some(4));

        // A provider change means a new dimension; reindex re-establishes it
        let embedder_v2 = StubEmbedder::new(8);
        let stats = cmd_reindex(&config, &store, &embedder_v2, "global")
            .await
            .unwrap();

        assert_eq!(stats.errors, 0);
        assert_eq!(store.collection_dimension("global").await.unwrap(), Some(8));
    }

    #[tokio::test]
    async fn test_reindex_empty_collection_is_noop() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        let stats = cmd_reindex(&config, &store, &embedder, "missing")
            .await
            .unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.indexed, 0);
    }
}
