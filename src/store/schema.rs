//! SQLite schema definition

/// SQL schema for the retrieval database
pub const SCHEMA_SQL: &str = r#"
-- Collections: one row per tag, holding the established embedding dimension
CREATE TABLE IF NOT EXISTS collections (
    tag TEXT PRIMARY KEY,
    dimension INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

-- Documents: registered source files/uploads
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    collection TEXT NOT NULL,
    display_name TEXT,
    stored_path TEXT,
    owner_id TEXT,
    conversation_id TEXT,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Chunks: embedded text spans, the unit of retrieval
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    collection TEXT NOT NULL,
    doc_id TEXT NOT NULL,
    owner_id TEXT,
    conversation_id TEXT,
    chunk_index INTEGER NOT NULL,
    chunk_text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(collection, doc_id, chunk_index)
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
CREATE INDEX IF NOT EXISTS idx_chunks_collection_created ON chunks(collection, created_at);
CREATE INDEX IF NOT EXISTS idx_chunks_doc ON chunks(collection, doc_id);
"#;
