//! File-backed vector store
//!
//! A collection lives in `<uploads>/<namespace>/index/<collection>/` as a
//! `meta.json` descriptor and a `points.jsonl` log. Search is an exact cosine
//! scan; equal scores keep insertion order.

use super::{check_dimensions, new_collection_name, ChunkPoint, IndexHandle, ScoredChunk, VectorStore};
use crate::error::{Error, Result};
use crate::namespace::NamespaceStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const META_FILE: &str = "meta.json";
const POINTS_FILE: &str = "points.jsonl";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionMeta {
    namespace: String,
    collection: String,
    dimension: usize,
    created_at: DateTime<Utc>,
}

/// Vector store persisted next to the uploaded documents
#[derive(Debug, Clone)]
pub struct LocalStore {
    namespaces: NamespaceStore,
    prefix: String,
}

impl LocalStore {
    pub fn new(namespaces: NamespaceStore, prefix: &str) -> Self {
        Self {
            namespaces,
            prefix: prefix.to_string(),
        }
    }

    fn collection_dir(&self, namespace: &str, collection: &str) -> PathBuf {
        self.namespaces.index_dir(namespace).join(collection)
    }

    async fn read_points(&self, handle: &IndexHandle) -> Result<Vec<ChunkPoint>> {
        let path = self
            .collection_dir(&handle.namespace, &handle.collection)
            .join(POINTS_FILE);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Index(format!("Failed to read {}: {}", path.display(), e))),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str::<ChunkPoint>(line)
                    .map_err(|e| Error::Index(format!("Corrupt point in {}: {}", path.display(), e)))
            })
            .collect()
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for LocalStore {
    async fn create(&self, namespace: &str, dimension: usize) -> Result<IndexHandle> {
        let collection = new_collection_name(&self.prefix, namespace);
        let dir = self.collection_dir(namespace, &collection);
        tokio::fs::create_dir_all(&dir).await?;

        let meta = CollectionMeta {
            namespace: namespace.to_string(),
            collection: collection.clone(),
            dimension,
            created_at: Utc::now(),
        };
        tokio::fs::write(dir.join(META_FILE), serde_json::to_vec_pretty(&meta)?).await?;
        tokio::fs::write(dir.join(POINTS_FILE), b"").await?;

        info!("Created local collection {} with dimension {}", collection, dimension);
        Ok(IndexHandle {
            namespace: namespace.to_string(),
            collection,
            dimension,
        })
    }

    async fn open(&self, namespace: &str, collection: &str) -> Result<IndexHandle> {
        let path = self.collection_dir(namespace, collection).join(META_FILE);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            Error::IndexOpen(format!("Collection '{}' unavailable: {}", collection, e))
        })?;
        let meta: CollectionMeta = serde_json::from_slice(&bytes)
            .map_err(|e| Error::IndexOpen(format!("Collection '{}' is corrupt: {}", collection, e)))?;

        Ok(IndexHandle {
            namespace: meta.namespace,
            collection: meta.collection,
            dimension: meta.dimension,
        })
    }

    async fn upsert(&self, handle: &IndexHandle, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        check_dimensions(handle, &points)?;

        let mut buf = Vec::new();
        for point in &points {
            serde_json::to_writer(&mut buf, point)?;
            buf.push(b'\n');
        }

        let path = self
            .collection_dir(&handle.namespace, &handle.collection)
            .join(POINTS_FILE);
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::Index(format!("Failed to open {}: {}", path.display(), e)))?;
        file.write_all(&buf).await?;
        file.flush().await?;

        debug!("Upserted {} points to collection {}", points.len(), handle.collection);
        Ok(())
    }

    async fn query(&self, handle: &IndexHandle, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredChunk>> {
        if vector.len() != handle.dimension {
            return Err(Error::Index(format!(
                "Query vector has dimension {}, collection '{}' expects {}",
                vector.len(),
                handle.collection,
                handle.dimension
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .read_points(handle)
            .await?
            .into_iter()
            .map(|p| ScoredChunk {
                id: p.id.to_string(),
                score: cosine_similarity(&vector, &p.vector),
                payload: p.payload,
            })
            .collect();

        // Stable sort keeps insertion order for equal scores
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        debug!("Local search in {} returned {} hits", handle.collection, scored.len());
        Ok(scored)
    }

    async fn discard(&self, handle: &IndexHandle) -> Result<()> {
        let dir = self.collection_dir(&handle.namespace, &handle.collection);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!("Discarded local collection {}", handle.collection);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &str {
        "local"
    }
}
