//! Custom error types for modelrag

use std::time::Duration;
use thiserror::Error;

/// Main error type for modelrag operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid model name '{0}': use 1-64 letters, digits, '_', '-' or '.', not starting with '.'")]
    InvalidNamespace(String),

    #[error("Model not found: {0}")]
    NamespaceNotFound(String),

    #[error("No documents uploaded for model '{0}'")]
    NoDocuments(String),

    #[error("RAG pipeline not created for model '{0}'")]
    IndexNotFound(String),

    #[error("RAG pipeline for model '{0}' is still being built")]
    IndexNotReady(String),

    #[error("Ingestion error: {0}")]
    Ingest(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Failed to open index: {0}")]
    IndexOpen(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Qdrant error: {0}")]
    Qdrant(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM request timed out after {:?}", .0)]
    Timeout(Duration),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification used at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input (400)
    InvalidRequest,
    /// Namespace, documents or index absent (404)
    NotFound,
    /// Index build in progress (409)
    NotReady,
    /// A collaborator (reader, embedder, index, LLM) failed (500)
    Upstream,
    /// The LLM call exceeded its deadline (500)
    Timeout,
    /// Local failure: config, filesystem, serialization (500)
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRequest(_) | Error::InvalidNamespace(_) => ErrorKind::InvalidRequest,
            Error::NamespaceNotFound(_) | Error::NoDocuments(_) | Error::IndexNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::IndexNotReady(_) => ErrorKind::NotReady,
            Error::Ingest(_)
            | Error::Parse(_)
            | Error::Embedding(_)
            | Error::IndexOpen(_)
            | Error::Index(_)
            | Error::Qdrant(_)
            | Error::Llm(_)
            | Error::Http(_) => ErrorKind::Upstream,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Config(_)
            | Error::Io(_)
            | Error::UrlParse(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::Other(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for modelrag
pub type Result<T> = std::result::Result<T, Error>;

/// Convert qdrant errors
impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Error::Qdrant(err.to_string())
    }
}
