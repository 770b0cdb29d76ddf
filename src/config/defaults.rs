//! Default values for configuration

/// Default embedding backend base URL (OpenAI-compatible endpoint)
pub fn default_backend_url() -> String {
    std::env::var("PARALEGAL_EMBEDDING_BACKEND_URL")
        .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string())
}

/// Default embedding provider wire format
pub fn default_provider() -> String {
    "openai".to_string()
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

/// Default embedding dimension (must match model)
pub fn default_embedding_dimension() -> usize {
    768
}

/// Default environment variable holding the provider API key
pub fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

/// Default batch size for embedding requests
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default embedding request timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default retry attempts after the first embedding request failure
pub fn default_embedding_retries() -> usize {
    2
}

/// Default maximum characters per chunk
pub fn default_chunk_size() -> usize {
    1000
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Default collection tag
pub fn default_collection() -> String {
    "global".to_string()
}

/// Default number of query results
pub fn default_query_top_k() -> usize {
    6
}

/// Default minimum similarity score (-1.0 = no cutoff)
pub fn default_query_min_score() -> f32 {
    -1.0
}

/// Default candidate scan bound for a search
pub fn default_scan_limit() -> usize {
    2000
}

/// Default character budget for assembled context (0 = unlimited)
pub fn default_max_context_chars() -> usize {
    0
}
