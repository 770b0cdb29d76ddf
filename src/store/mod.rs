//! Chunk and document storage using SQLite
//!
//! This module owns all durable retrieval state:
//! - Collections (one embedding dimension per tag, established at first write)
//! - Documents (registered source files, enumerated by reindex)
//! - Chunks (embedded text spans with their vectors)
//!
//! Search is a bounded most-recent-first scan with in-process scoring; the
//! store deliberately does no nearest-neighbor indexing of its own.

mod schema;

pub use schema::*;

use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// A registered source document
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub collection: String,
    pub display_name: Option<String>,
    pub stored_path: Option<String>,
    pub owner_id: Option<String>,
    pub conversation_id: Option<String>,
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentRecord {
    pub fn new(id: String, collection: String, content_hash: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id,
            collection,
            display_name: None,
            stored_path: None,
            owner_id: None,
            conversation_id: None,
            content_hash,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A stored chunk with its embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub collection: String,
    pub doc_id: String,
    pub owner_id: Option<String>,
    pub conversation_id: Option<String>,
    pub chunk_index: i64,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    pub created_at: String,
}

/// Chunk data supplied by the indexer; id and created_at are assigned on insert
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub collection: String,
    pub doc_id: String,
    pub owner_id: Option<String>,
    pub conversation_id: Option<String>,
    pub chunk_index: i64,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, FromRow)]
struct ChunkRow {
    id: String,
    collection: String,
    doc_id: String,
    owner_id: Option<String>,
    conversation_id: Option<String>,
    chunk_index: i64,
    chunk_text: String,
    embedding: Vec<u8>,
    created_at: String,
}

impl From<ChunkRow> for ChunkRecord {
    fn from(row: ChunkRow) -> Self {
        Self {
            id: row.id,
            collection: row.collection,
            doc_id: row.doc_id,
            owner_id: row.owner_id,
            conversation_id: row.conversation_id,
            chunk_index: row.chunk_index,
            chunk_text: row.chunk_text,
            embedding: decode_vector(&row.embedding),
            created_at: row.created_at,
        }
    }
}

/// Per-collection summary for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub tag: String,
    pub dimension: usize,
    pub chunks: i64,
    pub documents: i64,
}

/// Encode an embedding as little-endian f32 bytes
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into an embedding
pub fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Retrieval database handle
#[derive(Clone)]
pub struct VectorStore {
    pool: SqlitePool,
}

impl VectorStore {
    /// Connect to the database file, creating it if missing
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if the database has been initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='chunks'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    // ===== Collection Operations =====

    /// Get the established embedding dimension for a collection, if any
    pub async fn collection_dimension(&self, collection: &str) -> Result<Option<usize>> {
        let dim: Option<(i64,)> =
            sqlx::query_as("SELECT dimension FROM collections WHERE tag = ?")
                .bind(collection)
                .fetch_optional(&self.pool)
                .await?;
        Ok(dim.map(|(d,)| d as usize))
    }

    /// Establish or verify the collection's dimension
    async fn ensure_dimension(&self, collection: &str, dimension: usize) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO collections (tag, dimension, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(tag) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(dimension as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let established = self
            .collection_dimension(collection)
            .await?
            .unwrap_or(dimension);

        if established != dimension {
            return Err(Error::DimensionMismatch {
                collection: collection.to_string(),
                expected: established,
                got: dimension,
            });
        }
        Ok(())
    }

    /// Summaries of all known collections
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT tag, dimension FROM collections ORDER BY tag")
                .fetch_all(&self.pool)
                .await?;

        let mut infos = Vec::with_capacity(rows.len());
        for (tag, dimension) in rows {
            let (chunks,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM chunks WHERE collection = ?")
                    .bind(&tag)
                    .fetch_one(&self.pool)
                    .await?;
            let (documents,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = ?")
                    .bind(&tag)
                    .fetch_one(&self.pool)
                    .await?;
            infos.push(CollectionInfo {
                tag,
                dimension: dimension as usize,
                chunks,
                documents,
            });
        }
        Ok(infos)
    }

    /// Delete all chunks for a collection and clear its dimension ledger entry.
    /// Returns the number of chunks removed.
    pub async fn reset_collection(&self, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE collection = ?")
            .bind(collection)
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM collections WHERE tag = ?")
            .bind(collection)
            .execute(&self.pool)
            .await?;

        info!(
            collection = collection,
            removed = result.rows_affected(),
            "Collection reset"
        );
        Ok(result.rows_affected())
    }

    // ===== Chunk Operations =====

    /// Insert a chunk, enforcing the collection's dimension
    pub async fn put_chunk(&self, chunk: NewChunk) -> Result<ChunkRecord> {
        self.ensure_dimension(&chunk.collection, chunk.embedding.len())
            .await?;

        let record = ChunkRecord {
            id: Uuid::new_v4().to_string(),
            collection: chunk.collection,
            doc_id: chunk.doc_id,
            owner_id: chunk.owner_id,
            conversation_id: chunk.conversation_id,
            chunk_index: chunk.chunk_index,
            chunk_text: chunk.chunk_text,
            embedding: chunk.embedding,
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            r#"
            INSERT INTO chunks (id, collection, doc_id, owner_id, conversation_id, chunk_index, chunk_text, embedding, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.collection)
        .bind(&record.doc_id)
        .bind(&record.owner_id)
        .bind(&record.conversation_id)
        .bind(record.chunk_index)
        .bind(&record.chunk_text)
        .bind(encode_vector(&record.embedding))
        .bind(&record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Remove all chunks for a source document. Idempotent: unknown ids
    /// return 0.
    pub async fn delete_by_source(&self, doc_id: &str, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE doc_id = ? AND collection = ?")
            .bind(doc_id)
            .bind(collection)
            .execute(&self.pool)
            .await?;

        debug!(
            doc_id = doc_id,
            collection = collection,
            removed = result.rows_affected(),
            "Deleted chunks by source"
        );
        Ok(result.rows_affected())
    }

    /// Fetch up to `limit` chunks for a collection, most recently created
    /// first. Candidate supply for the exhaustive similarity scan.
    pub async fn scan(&self, collection: &str, limit: usize) -> Result<Vec<ChunkRecord>> {
        let rows = sqlx::query_as::<_, ChunkRow>(
            r#"
            SELECT id, collection, doc_id, owner_id, conversation_id, chunk_index, chunk_text, embedding, created_at
            FROM chunks
            WHERE collection = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(collection)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChunkRecord::from).collect())
    }

    /// Count chunks in a collection
    pub async fn count_chunks(&self, collection: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chunks WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ===== Document Operations =====

    /// Insert or update a document registration
    pub async fn register_document(&self, doc: &DocumentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, display_name, stored_path, owner_id, conversation_id, content_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                collection = excluded.collection,
                display_name = excluded.display_name,
                stored_path = excluded.stored_path,
                owner_id = excluded.owner_id,
                conversation_id = excluded.conversation_id,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.collection)
        .bind(&doc.display_name)
        .bind(&doc.stored_path)
        .bind(&doc.owner_id)
        .bind(&doc.conversation_id)
        .bind(&doc.content_hash)
        .bind(&doc.created_at)
        .bind(&doc.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a document registration by id
    pub async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>> {
        let doc = sqlx::query_as::<_, DocumentRecord>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    /// List registered documents for a collection
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRecord>> {
        let docs = sqlx::query_as::<_, DocumentRecord>(
            "SELECT * FROM documents WHERE collection = ? ORDER BY created_at DESC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    /// Remove a document registration. Returns rows removed (0 or 1).
    pub async fn remove_document(&self, id: &str, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND collection = ?")
            .bind(id)
            .bind(collection)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
