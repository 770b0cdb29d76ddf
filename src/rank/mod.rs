//! Similarity scoring and result ranking
//!
//! Scores candidate chunks against a query vector by dot product. Both sides
//! are unit-normalized at write time, so the dot product is the cosine
//! similarity and scores lie in [-1, 1].

use crate::store::ChunkRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A chunk scored against a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub chunk_text: String,
    pub doc_id: String,
    pub chunk_index: i64,
    pub collection: String,
    pub created_at: String,
}

impl ScoredChunk {
    fn new(score: f32, chunk: ChunkRecord) -> Self {
        Self {
            score,
            chunk_text: chunk.chunk_text,
            doc_id: chunk.doc_id,
            chunk_index: chunk.chunk_index,
            collection: chunk.collection,
            created_at: chunk.created_at,
        }
    }
}

/// Dot product over the shared prefix of two vectors
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Score candidates against a normalized query vector and keep the top k.
///
/// Ordering is descending by score; ties break by more recent `created_at`,
/// then by id, so results are deterministic.
pub fn rank_chunks(
    query_vector: &[f32],
    candidates: Vec<ChunkRecord>,
    top_k: usize,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<(String, ScoredChunk)> = candidates
        .into_iter()
        .map(|chunk| {
            let score = dot(query_vector, &chunk.embedding);
            (chunk.id.clone(), ScoredChunk::new(score, chunk))
        })
        .collect();

    scored.sort_by(|(a_id, a), (b_id, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b_id.cmp(a_id))
    });

    scored.truncate(top_k);
    scored.into_iter().map(|(_, hit)| hit).collect()
}

/// Drop hits below a minimum score
pub fn filter_by_score(hits: Vec<ScoredChunk>, min_score: f32) -> Vec<ScoredChunk> {
    hits.into_iter().filter(|h| h.score >= min_score).collect()
}

/// Keep hits in rank order until a character budget is exhausted.
///
/// The top hit is always kept, even when it alone exceeds the budget, so
/// trimming never empties a non-empty result. A budget of 0 means unlimited.
pub fn trim_to_budget(hits: Vec<ScoredChunk>, max_chars: usize) -> Vec<ScoredChunk> {
    if max_chars == 0 {
        return hits;
    }

    let mut kept = Vec::new();
    let mut used = 0usize;
    for hit in hits {
        let len = hit.chunk_text.len();
        if !kept.is_empty() && used + len > max_chars {
            break;
        }
        used += len;
        kept.push(hit);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(id: &str, embedding: Vec<f32>, created_at: &str, text: &str) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            collection: "global".to_string(),
            doc_id: "doc-1".to_string(),
            owner_id: None,
            conversation_id: None,
            chunk_index: 0,
            chunk_text: text.to_string(),
            embedding,
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_dot_equals_cosine_for_unit_vectors() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = [1.0, 0.0];
        assert_eq!(dot(&a, &b), 0.0);
        assert_eq!(dot(&a, &c), 1.0);
        assert_eq!(dot(&a, &[-1.0, 0.0]), -1.0);
    }

    #[test]
    fn test_scores_bounded_for_random_unit_vectors() {
        // Deterministic pseudo-random vectors, normalized by construction
        let mut seed = 0x2545f4914f6cdd1du64;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed as f64 / u64::MAX as f64) as f32 - 0.5
        };

        for _ in 0..100 {
            let a: Vec<f32> = (0..16).map(|_| next()).collect();
            let b: Vec<f32> = (0..16).map(|_| next()).collect();
            let a = crate::embed::normalize_embedding(&a);
            let b = crate::embed::normalize_embedding(&b);

            let score = dot(&a, &b);
            assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&score));
        }
    }

    #[test]
    fn test_rank_descending_with_top_k() {
        let candidates = vec![
            make_record("a", vec![0.5, 0.5], "2026-01-01T00:00:00+00:00", "a"),
            make_record("b", vec![1.0, 0.0], "2026-01-01T00:00:00+00:00", "b"),
            make_record("c", vec![0.0, 1.0], "2026-01-01T00:00:00+00:00", "c"),
        ];

        let hits = rank_chunks(&[1.0, 0.0], candidates, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_text, "b");
        assert_eq!(hits[1].chunk_text, "a");
    }

    #[test]
    fn test_ties_break_by_recency() {
        let candidates = vec![
            make_record("old", vec![1.0, 0.0], "2026-01-01T00:00:00+00:00", "old"),
            make_record("new", vec![1.0, 0.0], "2026-02-01T00:00:00+00:00", "new"),
        ];

        let hits = rank_chunks(&[1.0, 0.0], candidates, 10);
        assert_eq!(hits[0].chunk_text, "new");
        assert_eq!(hits[1].chunk_text, "old");
    }

    #[test]
    fn test_empty_candidates_rank_empty() {
        assert!(rank_chunks(&[1.0, 0.0], Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_filter_by_score() {
        let candidates = vec![
            make_record("a", vec![1.0, 0.0], "2026-01-01T00:00:00+00:00", "a"),
            make_record("b", vec![0.0, 1.0], "2026-01-01T00:00:00+00:00", "b"),
        ];
        let hits = rank_chunks(&[1.0, 0.0], candidates, 10);
        let filtered = filter_by_score(hits, 0.5);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].chunk_text, "a");
    }

    #[test]
    fn test_trim_to_budget_keeps_top_hit() {
        let candidates = vec![
            make_record("a", vec![1.0, 0.0], "2026-01-01T00:00:00+00:00", &"x".repeat(500)),
            make_record("b", vec![0.9, 0.1], "2026-01-01T00:00:00+00:00", &"y".repeat(500)),
        ];
        let hits = rank_chunks(&[1.0, 0.0], candidates, 10);

        // Budget smaller than the first hit still keeps it
        let trimmed = trim_to_budget(hits.clone(), 100);
        assert_eq!(trimmed.len(), 1);

        // Budget of zero means unlimited
        let untrimmed = trim_to_budget(hits.clone(), 0);
        assert_eq!(untrimmed.len(), 2);

        // Budget covering one hit drops the second
        let trimmed = trim_to_budget(hits, 600);
        assert_eq!(trimmed.len(), 1);
    }
}
