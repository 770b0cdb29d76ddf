//! Document indexing: chunk, embed, store
//!
//! The orchestrator runs chunking, embedding, and storage for one document.
//! Chunks are embedded and stored in sequence order; a chunk whose embedding
//! fails is skipped and tallied, never aborting the rest of the document.

use crate::chunk::{compute_text_hash, Chunker};
use crate::config::Config;
use crate::embed::{normalize_embedding, Embedder};
use crate::error::{Error, Result};
use crate::extract::extract_text;
use crate::store::{DocumentRecord, NewChunk, VectorStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of indexing one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSummary {
    pub chunks_attempted: usize,
    pub chunks_stored: usize,
    pub chunks_failed: usize,
}

/// How the host should report an indexing run to the end user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    /// Nothing to index (empty document)
    Empty,
    /// Every chunk was stored
    Full,
    /// Some chunks were stored, some skipped
    Partial,
    /// No chunk could be stored
    Failed,
}

impl IndexSummary {
    pub fn status(&self) -> IndexStatus {
        if self.chunks_attempted == 0 {
            IndexStatus::Empty
        } else if self.chunks_stored == self.chunks_attempted {
            IndexStatus::Full
        } else if self.chunks_stored > 0 {
            IndexStatus::Partial
        } else {
            IndexStatus::Failed
        }
    }
}

/// Index one document's text into a collection.
///
/// Per-chunk embedding failures are tallied in the summary; a provider-wide
/// outage (every chunk failed) propagates as an error so the host can ask
/// the user to retry the upload.
pub async fn cmd_index_document(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    text: &str,
    doc_id: &str,
    collection: &str,
    owner_id: Option<&str>,
    conversation_id: Option<&str>,
) -> Result<IndexSummary> {
    let chunker = Chunker::from_config(&config.chunk)?;
    let chunks: Vec<String> = chunker.chunks(text).collect();

    let mut summary = IndexSummary {
        chunks_attempted: chunks.len(),
        ..Default::default()
    };

    if chunks.is_empty() {
        debug!(doc_id = doc_id, "No chunks generated");
        return Ok(summary);
    }

    info!(
        doc_id = doc_id,
        collection = collection,
        chunks = chunks.len(),
        "Indexing document"
    );

    let mut last_embed_error: Option<Error> = None;
    let batch_size = config.embedding.batch_size.max(1);
    let mut next_index = 0i64;

    for batch in chunks.chunks(batch_size) {
        let embedded = embed_batch(embedder, batch, &mut summary, &mut last_embed_error).await;

        // Store in sequence order; indexes count every attempted chunk so a
        // stored chunk's position always reflects its offset in the source
        for maybe_vector in embedded {
            let chunk_index = next_index;
            next_index += 1;

            let Some((chunk_text, vector)) = maybe_vector else {
                continue;
            };

            store
                .put_chunk(NewChunk {
                    collection: collection.to_string(),
                    doc_id: doc_id.to_string(),
                    owner_id: owner_id.map(String::from),
                    conversation_id: conversation_id.map(String::from),
                    chunk_index,
                    chunk_text,
                    embedding: normalize_embedding(&vector),
                })
                .await?;
            summary.chunks_stored += 1;
        }
    }

    if summary.chunks_stored == 0 {
        if let Some(err) = last_embed_error {
            return Err(err);
        }
    }

    if summary.chunks_failed > 0 {
        warn!(
            doc_id = doc_id,
            failed = summary.chunks_failed,
            stored = summary.chunks_stored,
            "Some chunks were not embedded"
        );
    }

    Ok(summary)
}

/// Embed one batch, falling back to chunk-by-chunk calls when the batch
/// request fails. Returns one slot per input chunk, `None` where embedding
/// failed.
async fn embed_batch(
    embedder: &dyn Embedder,
    batch: &[String],
    summary: &mut IndexSummary,
    last_embed_error: &mut Option<Error>,
) -> Vec<Option<(String, Vec<f32>)>> {
    match embedder.embed(batch.to_vec()).await {
        Ok(vectors) if vectors.len() == batch.len() => batch
            .iter()
            .zip(vectors)
            .map(|(text, vector)| Some((text.clone(), vector)))
            .collect(),
        Ok(vectors) => {
            warn!(
                expected = batch.len(),
                got = vectors.len(),
                "Backend returned a short batch; retrying chunks individually"
            );
            embed_singly(embedder, batch, summary, last_embed_error).await
        }
        Err(e) => {
            warn!(error = %e, "Batch embedding failed; retrying chunks individually");
            *last_embed_error = Some(e);
            embed_singly(embedder, batch, summary, last_embed_error).await
        }
    }
}

async fn embed_singly(
    embedder: &dyn Embedder,
    batch: &[String],
    summary: &mut IndexSummary,
    last_embed_error: &mut Option<Error>,
) -> Vec<Option<(String, Vec<f32>)>> {
    let mut out = Vec::with_capacity(batch.len());
    for text in batch {
        match embedder.embed(vec![text.clone()]).await {
            Ok(mut vectors) if !vectors.is_empty() => {
                out.push(Some((text.clone(), vectors.remove(0))));
            }
            Ok(_) => {
                summary.chunks_failed += 1;
                *last_embed_error =
                    Some(Error::Embedding("Backend returned no embedding".to_string()));
                out.push(None);
            }
            Err(e) => {
                summary.chunks_failed += 1;
                *last_embed_error = Some(e);
                out.push(None);
            }
        }
    }
    out
}

/// Ingest a stored file: extract, register, replace any previous chunks,
/// index. The document id is stable for a given canonical path.
pub async fn cmd_ingest_file(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    path: &Path,
    collection: &str,
    name: Option<String>,
    owner_id: Option<&str>,
    conversation_id: Option<&str>,
) -> Result<(DocumentRecord, IndexSummary)> {
    let canonical = path
        .canonicalize()
        .map_err(|e| Error::InvalidPath(format!("{}: {}", path.display(), e)))?;

    let text = extract_text(&canonical)?;
    let doc_id = Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        canonical.display().to_string().as_bytes(),
    )
    .to_string();

    let mut doc = DocumentRecord::new(
        doc_id.clone(),
        collection.to_string(),
        compute_text_hash(&text),
    );
    doc.display_name = name.or_else(|| {
        canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    });
    doc.stored_path = Some(canonical.display().to_string());
    doc.owner_id = owner_id.map(String::from);
    doc.conversation_id = conversation_id.map(String::from);
    doc.updated_at = Utc::now().to_rfc3339();
    store.register_document(&doc).await?;

    // Replace semantics: a re-upload of the same path supersedes its chunks
    let removed = store.delete_by_source(&doc_id, collection).await?;
    if removed > 0 {
        debug!(doc_id = %doc_id, removed, "Replaced existing chunks");
    }

    let summary = cmd_index_document(
        config,
        store,
        embedder,
        &text,
        &doc_id,
        collection,
        owner_id,
        conversation_id,
    )
    .await?;

    Ok((doc, summary))
}

/// Print an index summary to the console
pub fn print_index_summary(doc: &DocumentRecord, summary: &IndexSummary) {
    let label = doc.display_name.as_deref().unwrap_or(&doc.id);
    match summary.status() {
        IndexStatus::Full => {
            println!("✓ Indexed '{}': {} chunks stored", label, summary.chunks_stored);
        }
        IndexStatus::Partial => {
            println!(
                "⚠ Partially indexed '{}': {} of {} chunks stored ({} failed)",
                label, summary.chunks_stored, summary.chunks_attempted, summary.chunks_failed
            );
        }
        IndexStatus::Failed => {
            println!("✗ Failed to index '{}': no chunks stored", label);
        }
        IndexStatus::Empty => {
            println!("'{}' produced no chunks (empty document)", label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_store, StubEmbedder};
    use tempfile::TempDir;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.chunk.chunk_size = 100;
        config.chunk.overlap = 20;
        config.embedding.batch_size = 2;
        config
    }

    #[tokio::test]
    async fn test_index_document_stores_all_chunks_in_order() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph goes here with more words.\n\nFourth.";
        let summary = cmd_index_document(
            &config,
            &store,
            &embedder,
            text,
            "doc-1",
            "global",
            Some("user-1"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(summary.status(), IndexStatus::Full);
        assert_eq!(summary.chunks_stored, summary.chunks_attempted);
        assert!(summary.chunks_attempted >= 1);

        let mut stored = store.scan("global", 100).await.unwrap();
        stored.sort_by_key(|c| c.chunk_index);

        // Sequence indexes are contiguous from zero
        for (i, chunk) in stored.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as i64);
            assert_eq!(chunk.doc_id, "doc-1");
            assert_eq!(chunk.owner_id.as_deref(), Some("user-1"));

            // Unit-length at rest
            let norm: f32 = chunk.embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn test_empty_document_is_empty_summary() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        let summary =
            cmd_index_document(&config, &store, &embedder, "", "doc-1", "global", None, None)
                .await
                .unwrap();

        assert_eq!(summary.status(), IndexStatus::Empty);
        assert_eq!(summary.chunks_attempted, 0);
    }

    #[tokio::test]
    async fn test_partial_failure_skips_only_failed_chunks() {
        let (_dir, store) = test_store().await;
        let mut config = test_config();
        config.chunk.chunk_size = 30;
        config.chunk.overlap = 5;

        let paragraphs = ["Alpha clause text here.", "Beta clause text here..", "Gamma clause text here.", "Delta clause text here.", "Omega clause text here."];
        let text = paragraphs.join("\n\n");
        let embedder = StubEmbedder::failing_on(8, &[paragraphs[2]]);

        let summary = cmd_index_document(
            &config, &store, &embedder, &text, "doc-1", "global", None, None,
        )
        .await
        .unwrap();

        assert_eq!(summary.chunks_attempted, 5);
        assert_eq!(summary.chunks_stored, 4);
        assert_eq!(summary.chunks_failed, 1);
        assert_eq!(summary.status(), IndexStatus::Partial);

        // Only stored chunks are searchable
        let stored = store.scan("global", 100).await.unwrap();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|c| c.chunk_text != paragraphs[2]));
    }

    #[tokio::test]
    async fn test_provider_outage_propagates() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let mut embedder = StubEmbedder::new(8);
        embedder.fail_all = true;

        let err = cmd_index_document(
            &config,
            &store,
            &embedder,
            "Some document text.",
            "doc-1",
            "global",
            None,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::EmbeddingUnavailable(_)));
        assert_eq!(store.count_chunks("global").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ingest_file_replaces_previous_chunks() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        let upload_dir = TempDir::new().unwrap();
        let path = upload_dir.path().join("lease.txt");
        std::fs::write(&path, "Original lease terms.").unwrap();

        let (doc, summary) = cmd_ingest_file(
            &config, &store, &embedder, &path, "global", None, None, None,
        )
        .await
        .unwrap();
        assert_eq!(summary.chunks_stored, 1);

        std::fs::write(&path, "Amended lease terms.\n\nWith a second clause.").unwrap();
        let (doc2, summary2) = cmd_ingest_file(
            &config, &store, &embedder, &path, "global", None, None, None,
        )
        .await
        .unwrap();

        // Same path, same document id; old chunks are gone
        assert_eq!(doc.id, doc2.id);
        assert_eq!(summary2.chunks_stored as i64, store.count_chunks("global").await.unwrap());
        let stored = store.scan("global", 100).await.unwrap();
        assert!(stored.iter().all(|c| c.chunk_text != "Original lease terms."));
    }
}
