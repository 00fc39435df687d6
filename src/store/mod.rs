//! Vector index storage
//!
//! This module provides:
//! - A `VectorStore` trait over namespace-scoped collections
//! - A file-backed local store with exact cosine search
//! - A Qdrant-backed store
//!
//! Every index build writes into a freshly named collection. The pipeline
//! makes a collection visible only after all points are stored, and discards
//! it otherwise.

mod local;
mod payload;
mod qdrant;

pub use local::*;
pub use payload::*;
pub use qdrant::*;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::namespace::NamespaceStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Handle to one collection of a namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHandle {
    pub namespace: String,
    pub collection: String,
    pub dimension: usize,
}

/// A search hit
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Trait for vector index backends
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a new, empty collection for a namespace
    async fn create(&self, namespace: &str, dimension: usize) -> Result<IndexHandle>;

    /// Open an existing collection read-only
    async fn open(&self, namespace: &str, collection: &str) -> Result<IndexHandle>;

    /// Insert or replace points
    async fn upsert(&self, handle: &IndexHandle, points: Vec<ChunkPoint>) -> Result<()>;

    /// Return up to `top_k` chunks ranked by similarity, best first
    async fn query(&self, handle: &IndexHandle, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Remove a collection and everything in it
    async fn discard(&self, handle: &IndexHandle) -> Result<()>;

    /// Short backend identifier recorded in the index manifest
    fn backend_name(&self) -> &str;
}

/// Create the configured vector store
pub fn create_store(config: &IndexConfig, namespaces: &NamespaceStore) -> Result<Arc<dyn VectorStore>> {
    match config.backend.to_lowercase().as_str() {
        "local" => Ok(Arc::new(LocalStore::new(
            namespaces.clone(),
            &config.collection_prefix,
        ))),
        "qdrant" => Ok(Arc::new(QdrantStore::new(
            &config.qdrant_url,
            &config.collection_prefix,
        )?)),
        other => Err(Error::Config(format!("Unknown index backend '{}'", other))),
    }
}

/// Generate a unique collection name for a new build
pub fn new_collection_name(prefix: &str, namespace: &str) -> String {
    let build_id = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}_{}",
        prefix,
        namespace,
        Utc::now().format("%Y%m%d%H%M%S"),
        &build_id[..8]
    )
}

/// Reject vectors whose length does not match the collection
pub(crate) fn check_dimensions(handle: &IndexHandle, points: &[ChunkPoint]) -> Result<()> {
    if let Some(mismatch) = points.iter().find(|p| p.vector.len() != handle.dimension) {
        return Err(Error::Index(format!(
            "Vector dimension mismatch for collection '{}': expected {}, got {}",
            handle.collection,
            handle.dimension,
            mismatch.vector.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collection_names_are_unique() {
        let a = new_collection_name("modelrag", "Astro");
        let b = new_collection_name("modelrag", "Astro");
        assert!(a.starts_with("modelrag_Astro_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_create_store_by_backend() {
        let temp = TempDir::new().unwrap();
        let namespaces = NamespaceStore::new(temp.path());

        let local = create_store(&IndexConfig::default(), &namespaces).unwrap();
        assert_eq!(local.backend_name(), "local");

        let qdrant = IndexConfig {
            backend: "qdrant".to_string(),
            ..IndexConfig::default()
        };
        assert_eq!(create_store(&qdrant, &namespaces).unwrap().backend_name(), "qdrant");

        let unknown = IndexConfig {
            backend: "faiss".to_string(),
            ..IndexConfig::default()
        };
        assert!(matches!(create_store(&unknown, &namespaces), Err(Error::Config(_))));
    }
}
