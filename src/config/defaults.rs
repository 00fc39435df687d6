//! Default values for configuration

/// Default HTTP bind address (the address the frontend talks to)
pub fn default_bind() -> String {
    std::env::var("MODELRAG_BIND").unwrap_or_else(|_| "127.0.0.1:5000".to_string())
}

/// Default frontend origin allowed by CORS
pub fn default_frontend_origin() -> String {
    std::env::var("MODELRAG_FRONTEND_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:5173".to_string())
}

/// Default request body limit for uploads (256 MiB)
pub fn default_max_upload_bytes() -> usize {
    256 * 1024 * 1024
}

/// Default root directory for per-model uploads and indexes
pub fn default_uploads_dir() -> String {
    std::env::var("MODELRAG_UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string())
}

/// Default embedding provider
pub fn default_embedding_provider() -> String {
    "http".to_string()
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("MODELRAG_EMBEDDING_BACKEND_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "dunzhang/stella_en_400M_v5".to_string()
}

/// Default embedding dimension (stella_en_400M_v5)
pub fn default_embedding_dimension() -> usize {
    1024
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default embedding request timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    120
}

/// Default vector index backend
pub fn default_index_backend() -> String {
    "local".to_string()
}

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default prefix for Qdrant collection names
pub fn default_collection_prefix() -> String {
    "modelrag".to_string()
}

/// Default Ollama URL
pub fn default_llm_url() -> String {
    std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string())
}

/// Default generation model
pub fn default_llm_model() -> String {
    "llama3.2".to_string()
}

/// Default LLM request timeout in seconds
pub fn default_llm_timeout() -> u64 {
    420
}

/// Default number of chunks retrieved per query
pub fn default_query_top_k() -> usize {
    2
}

/// Default question-answering prompt
pub fn default_prompt_template() -> String {
    "Context information is below.\n\
     ---------------------\n\
     {context_str}\n\
     ---------------------\n\
     Given the context information and not prior knowledge, answer the query.\n\
     Query: {query_str}\n\
     Answer: "
        .to_string()
}

/// Default maximum characters per chunk
pub fn default_chunk_max_chars() -> usize {
    1500
}

/// Default minimum characters per chunk
pub fn default_chunk_min_chars() -> usize {
    100
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Default: prefer heading boundaries
pub fn default_prefer_heading_boundaries() -> bool {
    true
}
