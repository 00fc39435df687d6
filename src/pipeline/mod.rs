//! RAG pipeline controller
//!
//! Orchestrates the reader, chunker, embedder, vector store and language
//! model into two operations:
//! - `build`: index a namespace's uploaded documents exactly once
//! - `query`: answer a question from a namespace's committed index
//!
//! Per namespace the lifecycle is `NoIndex -> Building -> Ready`. The only
//! durable state is the committed-index manifest kept by `NamespaceStore`.

mod locks;
mod prompt;

pub use locks::*;
pub use prompt::*;

use crate::chunk::chunk_document;
use crate::config::{ChunkConfig, Config};
use crate::embed::{create_embedder, embed_in_batches, embed_one, Embedder};
use crate::error::{Error, ErrorKind, Result};
use crate::llm::{create_language_model, LanguageModel};
use crate::namespace::{validate_namespace, IndexManifest, NamespaceStore};
use crate::reader::{DirectoryReader, DocumentReader, ReadOptions};
use crate::store::{create_store, ChunkPayload, ChunkPoint, IndexHandle, VectorStore};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Points sent to the store per upsert call
const UPSERT_BATCH_SIZE: usize = 256;

/// Tunables of the controller
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Prompt template with context and query placeholders
    pub prompt_template: String,
    /// Chunking parameters
    pub chunk: ChunkConfig,
    /// Texts per embedding request
    pub embedding_batch_size: usize,
    /// Deadline for one LLM completion
    pub llm_timeout: Duration,
    /// How upload directories are read
    pub read_options: ReadOptions,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.query.top_k,
            prompt_template: config.query.prompt_template.clone(),
            chunk: config.chunk.clone(),
            embedding_batch_size: config.embedding.batch_size,
            llm_timeout: config.llm.request_timeout(),
            read_options: ReadOptions::default(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of a successful build call
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// A new index was built and committed
    Created {
        location: PathBuf,
        manifest: IndexManifest,
    },
    /// An index was already committed; nothing changed
    AlreadyExists {
        location: PathBuf,
        manifest: IndexManifest,
    },
}

impl BuildOutcome {
    /// Path of the committed manifest
    pub fn location(&self) -> &PathBuf {
        match self {
            BuildOutcome::Created { location, .. } | BuildOutcome::AlreadyExists { location, .. } => location,
        }
    }

    pub fn manifest(&self) -> &IndexManifest {
        match self {
            BuildOutcome::Created { manifest, .. } | BuildOutcome::AlreadyExists { manifest, .. } => manifest,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, BuildOutcome::Created { .. })
    }
}

/// A chunk that contributed to an answer
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub doc_path: String,
    pub chunk_index: i64,
    pub score: f32,
}

/// Answer to a question
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Externally visible state of a namespace
#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceStatus {
    NoIndex,
    Building,
    Ready(IndexManifest),
}

/// The pipeline controller; collaborators are injected once and shared
pub struct RagPipeline {
    settings: PipelineSettings,
    namespaces: NamespaceStore,
    reader: Arc<dyn DocumentReader>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
    locks: NamespaceLocks,
}

impl RagPipeline {
    pub fn new(
        settings: PipelineSettings,
        namespaces: NamespaceStore,
        reader: Arc<dyn DocumentReader>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            settings,
            namespaces,
            reader,
            embedder,
            store,
            llm,
            locks: NamespaceLocks::new(),
        }
    }

    /// Construct every collaborator from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let namespaces = NamespaceStore::new(config.uploads_root());
        let embedder = create_embedder(&config.embedding)?;
        let store = create_store(&config.index, &namespaces)?;
        let llm = create_language_model(&config.llm)?;

        info!(
            "Pipeline ready: embedder '{}', index backend '{}', llm '{}'",
            embedder.model_name(),
            store.backend_name(),
            llm.model_name()
        );

        Ok(Self::new(
            PipelineSettings::from_config(config),
            namespaces,
            Arc::new(DirectoryReader::new()),
            embedder,
            store,
            llm,
        ))
    }

    pub fn namespaces(&self) -> &NamespaceStore {
        &self.namespaces
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Build the index for a namespace unless one is already committed
    pub async fn build(&self, namespace: &str) -> Result<BuildOutcome> {
        validate_namespace(namespace)?;

        if let Some(manifest) = self.namespaces.read_manifest(namespace).await? {
            debug!("Index for '{}' already committed", namespace);
            return Ok(self.already_exists(namespace, manifest));
        }

        let lock = self.locks.acquire(namespace).await;
        let result = {
            let _guard = lock.write().await;
            self.build_locked(namespace).await
        };
        self.locks.release(namespace, lock).await;
        result
    }

    /// Build body; the caller holds the namespace's write lock
    async fn build_locked(&self, namespace: &str) -> Result<BuildOutcome> {
        // Another build may have committed while we waited
        if let Some(manifest) = self.namespaces.read_manifest(namespace).await? {
            debug!("Index for '{}' committed by a concurrent build", namespace);
            return Ok(self.already_exists(namespace, manifest));
        }

        let rag_dir = self.namespaces.rag_dir(namespace);
        if !tokio::fs::try_exists(&rag_dir).await.unwrap_or(false) {
            return Err(Error::NoDocuments(namespace.to_string()));
        }

        let started = Instant::now();
        info!("Building index for '{}' from {}", namespace, rag_dir.display());

        let documents = self
            .reader
            .read_documents(&rag_dir, &self.settings.read_options)
            .await
            .map_err(|e| upstream(e, Error::Ingest))?;
        if documents.is_empty() {
            return Err(Error::NoDocuments(namespace.to_string()));
        }

        let mut payloads = Vec::new();
        for doc in &documents {
            let title = doc.title();
            for chunk in chunk_document(&doc.content, &doc.content_hash, &self.settings.chunk) {
                payloads.push(ChunkPayload {
                    namespace: namespace.to_string(),
                    doc_id: doc.id.to_string(),
                    doc_path: doc.relative_path.clone(),
                    title: Some(title.clone()),
                    headings: chunk.headings,
                    chunk_index: chunk.index as i64,
                    text: chunk.text,
                    chunk_hash: chunk.hash,
                });
            }
        }
        if payloads.is_empty() {
            return Err(Error::NoDocuments(namespace.to_string()));
        }
        debug!(
            "Split {} documents into {} chunks",
            documents.len(),
            payloads.len()
        );

        let texts: Vec<String> = payloads.iter().map(|p| p.text.clone()).collect();
        let vectors = embed_in_batches(
            self.embedder.as_ref(),
            texts,
            self.settings.embedding_batch_size,
        )
        .await
        .map_err(|e| upstream(e, Error::Embedding))?;

        let dimension = vectors
            .first()
            .map(|v| v.len())
            .unwrap_or_else(|| self.embedder.dimension());

        let points: Vec<ChunkPoint> = payloads
            .into_iter()
            .zip(vectors)
            .map(|(payload, vector)| ChunkPoint {
                id: ChunkPoint::point_id(namespace, &payload.doc_id, payload.chunk_index as usize),
                vector,
                payload,
            })
            .collect();
        let chunk_count = points.len();

        let handle = self
            .store
            .create(namespace, dimension)
            .await
            .map_err(|e| upstream(e, Error::Index))?;

        if let Err(e) = self.fill_collection(&handle, points).await {
            self.discard_quietly(&handle).await;
            return Err(upstream(e, Error::Index));
        }

        let manifest = IndexManifest {
            collection: handle.collection.clone(),
            backend: self.store.backend_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            dimension,
            documents: documents.len(),
            chunks: chunk_count,
            created_at: Utc::now(),
        };

        let location = match self.namespaces.write_manifest(namespace, &manifest).await {
            Ok(location) => location,
            Err(e) => {
                self.discard_quietly(&handle).await;
                return Err(e);
            }
        };

        info!(
            "Index for '{}' committed: {} documents, {} chunks in {:.2?}",
            namespace,
            manifest.documents,
            manifest.chunks,
            started.elapsed()
        );

        Ok(BuildOutcome::Created { location, manifest })
    }

    /// Answer a question from a namespace's committed index
    pub async fn query(&self, namespace: &str, question: &str) -> Result<QueryAnswer> {
        validate_namespace(namespace)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("Query must not be empty".to_string()));
        }

        let handle = {
            // No entry means no build is running
            let lock = self.locks.peek(namespace).await;
            let _guard = match &lock {
                Some(lock) => Some(
                    lock.try_read()
                        .map_err(|_| Error::IndexNotReady(namespace.to_string()))?,
                ),
                None => None,
            };

            let manifest = self
                .namespaces
                .read_manifest(namespace)
                .await?
                .ok_or_else(|| Error::IndexNotFound(namespace.to_string()))?;

            if manifest.embedding_model != self.embedder.model_name() {
                return Err(Error::IndexOpen(format!(
                    "Index for '{}' was built with embedding model '{}', but '{}' is configured",
                    namespace,
                    manifest.embedding_model,
                    self.embedder.model_name()
                )));
            }

            let handle = self
                .store
                .open(namespace, &manifest.collection)
                .await
                .map_err(|e| match e {
                    Error::IndexOpen(_) => e,
                    other => Error::IndexOpen(other.to_string()),
                })?;
            handle
        };

        let vector = embed_one(self.embedder.as_ref(), question)
            .await
            .map_err(|e| upstream(e, Error::Embedding))?;

        let hits = self
            .store
            .query(&handle, vector, self.settings.top_k)
            .await
            .map_err(|e| upstream(e, Error::Index))?;
        debug!("Retrieved {} chunks for '{}'", hits.len(), namespace);

        let context = build_context(&hits);
        let prompt = render_prompt(&self.settings.prompt_template, &context, question);

        let timeout = self.settings.llm_timeout;
        let answer = match tokio::time::timeout(timeout, self.llm.complete(&prompt, timeout)).await {
            Ok(result) => result.map_err(|e| upstream(e, Error::Llm))?,
            Err(_) => return Err(Error::Timeout(timeout)),
        };

        let sources = hits
            .into_iter()
            .map(|h| SourceRef {
                doc_path: h.payload.doc_path,
                chunk_index: h.payload.chunk_index,
                score: h.score,
            })
            .collect();

        Ok(QueryAnswer { answer, sources })
    }

    /// Report where a namespace is in its lifecycle
    pub async fn status(&self, namespace: &str) -> Result<NamespaceStatus> {
        validate_namespace(namespace)?;

        let lock = self.locks.peek(namespace).await;
        let _guard = match &lock {
            Some(lock) => match lock.try_read() {
                Ok(guard) => Some(guard),
                Err(_) => return Ok(NamespaceStatus::Building),
            },
            None => None,
        };

        Ok(match self.namespaces.read_manifest(namespace).await? {
            Some(manifest) => NamespaceStatus::Ready(manifest),
            None => NamespaceStatus::NoIndex,
        })
    }

    fn already_exists(&self, namespace: &str, manifest: IndexManifest) -> BuildOutcome {
        BuildOutcome::AlreadyExists {
            location: self.namespaces.manifest_path(namespace),
            manifest,
        }
    }

    async fn fill_collection(&self, handle: &IndexHandle, points: Vec<ChunkPoint>) -> Result<()> {
        let mut points = points.into_iter().peekable();
        while points.peek().is_some() {
            let batch: Vec<ChunkPoint> = points.by_ref().take(UPSERT_BATCH_SIZE).collect();
            self.store.upsert(handle, batch).await?;
        }
        Ok(())
    }

    async fn discard_quietly(&self, handle: &IndexHandle) {
        if let Err(e) = self.store.discard(handle).await {
            warn!(
                "Failed to discard staging collection {}: {}",
                handle.collection, e
            );
        }
    }
}

/// Keep collaborator errors as they are; wrap local failures in the stage's kind
fn upstream(err: Error, wrap: fn(String) -> Error) -> Error {
    match err.kind() {
        ErrorKind::Upstream | ErrorKind::Timeout => err,
        _ => wrap(err.to_string()),
    }
}
