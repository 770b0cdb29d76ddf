//! Query command implementation

use crate::config::Config;
use crate::embed::{normalize_embedding, Embedder};
use crate::error::{Error, Result};
use crate::rank::{filter_by_score, rank_chunks, trim_to_budget, ScoredChunk};
use crate::store::VectorStore;
use serde::Serialize;
use tracing::{debug, info};

/// Query options
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Number of results to return
    pub top_k: Option<usize>,
    /// Minimum score threshold
    pub min_score: Option<f32>,
    /// Collection to search
    pub collection: Option<String>,
    /// Character budget for the assembled context (overrides config)
    pub max_context_chars: Option<usize>,
}

/// Search outcome for the host or CLI
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub collection: String,
    pub hits: Vec<ScoredChunk>,
    pub candidates_scanned: usize,
}

/// Execute a similarity search.
///
/// An empty or unknown collection yields an empty outcome; a failed query
/// embedding is an error, never a silent empty result.
pub async fn cmd_query(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    query: &str,
    options: QueryOptions,
) -> Result<SearchOutcome> {
    let collection = options
        .collection
        .unwrap_or_else(crate::config::default_collection);
    let top_k = options.top_k.unwrap_or(config.query.top_k).max(1);
    let min_score = options.min_score.unwrap_or(config.query.min_score);
    let budget = options
        .max_context_chars
        .unwrap_or(config.query.max_context_chars);

    if query.trim().is_empty() {
        return Err(Error::InvalidConfiguration(
            "Query text must not be empty".to_string(),
        ));
    }

    info!(collection = %collection, "Querying: {}", query);

    let candidates = store.scan(&collection, config.query.scan_limit).await?;
    if candidates.is_empty() {
        debug!(collection = %collection, "Collection is empty");
        return Ok(SearchOutcome {
            query: query.to_string(),
            collection,
            hits: Vec::new(),
            candidates_scanned: 0,
        });
    }

    let query_embeddings = embedder.embed(vec![query.to_string()]).await?;
    let query_vector = query_embeddings
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("No embedding returned for query".to_string()))?;
    let query_vector = normalize_embedding(&query_vector);

    let candidates_scanned = candidates.len();
    let hits = rank_chunks(&query_vector, candidates, top_k);
    let hits = filter_by_score(hits, min_score);
    let hits = trim_to_budget(hits, budget);

    info!("Returning {} results", hits.len());

    Ok(SearchOutcome {
        query: query.to_string(),
        collection,
        hits,
        candidates_scanned,
    })
}

/// Print query results to the console
pub fn print_query_results(outcome: &SearchOutcome) {
    println!("\n🔍 Query: {}\n", outcome.query);

    if outcome.hits.is_empty() {
        println!("No matching chunks in collection '{}'.", outcome.collection);
        return;
    }

    println!("Found {} results:\n", outcome.hits.len());
    for (i, hit) in outcome.hits.iter().enumerate() {
        println!(
            "{}. [score: {:.3}] {} (chunk {})",
            i + 1,
            hit.score,
            hit.doc_id,
            hit.chunk_index
        );

        let preview: String = if hit.chunk_text.len() > 200 {
            let cut = hit
                .chunk_text
                .char_indices()
                .take_while(|(idx, _)| *idx < 200)
                .last()
                .map(|(idx, c)| idx + c.len_utf8())
                .unwrap_or(hit.chunk_text.len());
            format!("{}...", hit.chunk_text[..cut].trim())
        } else {
            hit.chunk_text.trim().to_string()
        };
        println!("   {}\n", preview.replace('\n', " "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_store, StubEmbedder};
    use crate::commands::cmd_index_document;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.chunk.chunk_size = 50;
        config.chunk.overlap = 10;
        config
    }

    #[tokio::test]
    async fn test_empty_collection_returns_empty_outcome() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        let outcome = cmd_query(
            &config,
            &store,
            &embedder,
            "indemnification clause",
            QueryOptions::default(),
        )
        .await
        .unwrap();

        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.candidates_scanned, 0);
    }

    #[tokio::test]
    async fn test_exact_text_query_ranks_first_with_high_score() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        let text = "Termination requires thirty days notice.\n\nLiability is capped at fees paid.\n\nDisputes go to arbitration in Mumbai.";
        cmd_index_document(
            &config, &store, &embedder, text, "doc-1", "global", None, None,
        )
        .await
        .unwrap();

        let outcome = cmd_query(
            &config,
            &store,
            &embedder,
            "Liability is capped at fees paid.",
            QueryOptions {
                top_k: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(!outcome.hits.is_empty());
        assert_eq!(outcome.hits[0].chunk_text, "Liability is capped at fees paid.");
        assert!(outcome.hits[0].score > 0.99);
    }

    #[tokio::test]
    async fn test_query_embedding_failure_is_reported() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        cmd_index_document(
            &config, &store, &embedder, "Some clause.", "doc-1", "global", None, None,
        )
        .await
        .unwrap();

        let mut failing = StubEmbedder::new(8);
        failing.fail_all = true;

        let err = cmd_query(
            &config,
            &store,
            &failing,
            "anything",
            QueryOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_top_k_bounds_results() {
        let (_dir, store) = test_store().await;
        let config = test_config();
        let embedder = StubEmbedder::new(8);

        let text = (0..8)
            .map(|i| format!("Clause number {} with distinct wording.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        cmd_index_document(
            &config, &store, &embedder, &text, "doc-1", "global", None, None,
        )
        .await
        .unwrap();

        let outcome = cmd_query(
            &config,
            &store,
            &embedder,
            "Clause number 3 with distinct wording.",
            QueryOptions {
                top_k: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.hits.len(), 2);
        assert!(outcome.candidates_scanned >= 2);
    }
}
