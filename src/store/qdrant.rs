//! Qdrant vector database backend

use super::{check_dimensions, new_collection_name, ChunkPayload, ChunkPoint, IndexHandle, ScoredChunk, VectorStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, vectors_config, CreateCollectionBuilder, Distance,
    GetCollectionInfoResponse, PointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use tracing::{debug, info};

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    prefix: String,
}

impl QdrantStore {
    /// Create a client; no connection is made until the first request
    pub fn new(url: &str, prefix: &str) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            prefix: prefix.to_string(),
        })
    }
}

/// Vector size of an unnamed-vector collection
fn extract_vector_size(info: &GetCollectionInfoResponse) -> Option<usize> {
    let result = info.result.as_ref()?;
    let config = result.config.as_ref()?;
    let params = config.params.as_ref()?;
    let vectors_config = params.vectors_config.as_ref()?;

    match vectors_config.config.as_ref()? {
        vectors_config::Config::Params(params) => Some(params.size as usize),
        vectors_config::Config::ParamsMap(_) => None,
    }
}

/// Convert PointId to string
fn point_id_to_string(id: Option<PointId>) -> String {
    match id.and_then(|p| p.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn create(&self, namespace: &str, dimension: usize) -> Result<IndexHandle> {
        let collection = new_collection_name(&self.prefix, namespace);
        info!("Creating collection {} with dimension {}", collection, dimension);

        let vectors_config = VectorParamsBuilder::new(dimension as u64, Distance::Cosine);
        self.client
            .create_collection(CreateCollectionBuilder::new(&collection).vectors_config(vectors_config))
            .await?;

        Ok(IndexHandle {
            namespace: namespace.to_string(),
            collection,
            dimension,
        })
    }

    async fn open(&self, namespace: &str, collection: &str) -> Result<IndexHandle> {
        let exists = self
            .client
            .collection_exists(collection)
            .await
            .map_err(|e| Error::IndexOpen(e.to_string()))?;
        if !exists {
            return Err(Error::IndexOpen(format!(
                "Collection '{}' does not exist",
                collection
            )));
        }

        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| Error::IndexOpen(e.to_string()))?;
        let dimension = extract_vector_size(&info).ok_or_else(|| {
            Error::IndexOpen(format!(
                "Collection '{}' does not use a single unnamed vector",
                collection
            ))
        })?;

        Ok(IndexHandle {
            namespace: namespace.to_string(),
            collection: collection.to_string(),
            dimension,
        })
    }

    async fn upsert(&self, handle: &IndexHandle, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        check_dimensions(handle, &points)?;

        debug!(
            "Upserting {} points to collection {}",
            points.len(),
            handle.collection
        );

        let point_structs: Vec<PointStruct> =
            points.into_iter().map(|p| p.to_point_struct()).collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&handle.collection, point_structs).wait(true))
            .await?;

        Ok(())
    }

    async fn query(&self, handle: &IndexHandle, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredChunk>> {
        debug!(
            "Searching collection {} with limit {}",
            handle.collection, top_k
        );

        let search = SearchPointsBuilder::new(&handle.collection, vector, top_k as u64).with_payload(true);
        let response = self.client.search_points(search).await?;

        response
            .result
            .into_iter()
            .map(|p| {
                Ok(ScoredChunk {
                    id: point_id_to_string(p.id),
                    score: p.score,
                    payload: ChunkPayload::from_qdrant_payload(p.payload)?,
                })
            })
            .collect()
    }

    async fn discard(&self, handle: &IndexHandle) -> Result<()> {
        if self.client.collection_exists(&handle.collection).await? {
            info!("Deleting collection {}", handle.collection);
            self.client.delete_collection(&handle.collection).await?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_upsert_rejects_dimension_mismatch() {
        let store = QdrantStore::new("http://127.0.0.1:6334", "modelrag").expect("store should initialize");
        let handle = IndexHandle {
            namespace: "Astro".to_string(),
            collection: "modelrag_Astro_test".to_string(),
            dimension: 3,
        };

        let point = ChunkPoint {
            id: Uuid::new_v4(),
            vector: vec![0.1, 0.2],
            payload: ChunkPayload {
                namespace: "Astro".to_string(),
                doc_id: "doc-456".to_string(),
                doc_path: "readme.md".to_string(),
                title: None,
                headings: Vec::new(),
                chunk_index: 0,
                text: "text".to_string(),
                chunk_hash: "hash123".to_string(),
            },
        };

        let err = store
            .upsert(&handle, vec![point])
            .await
            .expect_err("should reject mismatched vector length");

        match err {
            Error::Index(message) => assert!(message.contains("Vector dimension mismatch")),
            other => panic!("expected index error, got {other:?}"),
        }
    }

    #[test]
    fn test_point_id_to_string() {
        let id = PointId {
            point_id_options: Some(PointIdOptions::Num(7)),
        };
        assert_eq!(point_id_to_string(Some(id)), "7");
        assert_eq!(point_id_to_string(None), "");
    }
}
