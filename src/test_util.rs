//! Shared test fixtures

use crate::embed::{normalize_embedding, Embedder};
use crate::error::{Error, Result};
use crate::store::VectorStore;
use async_trait::async_trait;
use std::collections::HashSet;
use tempfile::TempDir;

/// Deterministic embedder: identical strings map to identical vectors
pub(crate) struct StubEmbedder {
    pub dimension: usize,
    pub fail_texts: HashSet<String>,
    pub fail_all: bool,
}

impl StubEmbedder {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_texts: HashSet::new(),
            fail_all: false,
        }
    }

    pub(crate) fn failing_on(dimension: usize, texts: &[&str]) -> Self {
        Self {
            dimension,
            fail_texts: texts.iter().map(|t| t.to_string()).collect(),
            fail_all: false,
        }
    }

    pub(crate) fn vector_for(&self, text: &str) -> Vec<f32> {
        let hash = blake3::hash(text.as_bytes());
        let bytes = hash.as_bytes();
        let raw: Vec<f32> = (0..self.dimension)
            .map(|i| bytes[i % bytes.len()] as f32 - 127.5)
            .collect();
        normalize_embedding(&raw)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if self.fail_all {
            return Err(Error::EmbeddingUnavailable("stub outage".to_string()));
        }
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            if self.fail_texts.contains(&text) {
                return Err(Error::EmbeddingUnavailable(
                    "stub failure for configured text".to_string(),
                ));
            }
            out.push(self.vector_for(&text));
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

pub(crate) async fn test_store() -> (TempDir, VectorStore) {
    let dir = TempDir::new().unwrap();
    let store = VectorStore::connect(&dir.path().join("test.db"))
        .await
        .unwrap();
    store.init_schema().await.unwrap();
    (dir, store)
}
