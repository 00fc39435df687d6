//! Shared fixtures: deterministic collaborators and a pipeline on a temp dir

#![allow(dead_code)]

use async_trait::async_trait;
use modelrag::config::ChunkConfig;
use modelrag::embed::Embedder;
use modelrag::error::{Error, Result};
use modelrag::llm::LanguageModel;
use modelrag::namespace::NamespaceStore;
use modelrag::pipeline::{PipelineSettings, RagPipeline};
use modelrag::reader::DirectoryReader;
use modelrag::store::{ChunkPoint, IndexHandle, LocalStore, ScoredChunk, VectorStore};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

pub const DIMENSION: usize = 64;

/// Bag-of-words embedder: each lowercase word lands in a hashed bucket
pub struct HashingEmbedder;

impl HashingEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = blake3::hash(word.to_lowercase().as_bytes());
            let bucket = u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap()) as usize % DIMENSION;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "hashing-test"
    }
}

/// Embedder that always fails
pub struct BrokenEmbedder;

#[async_trait]
impl Embedder for BrokenEmbedder {
    async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Err(Error::Embedding("backend unavailable".to_string()))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "hashing-test"
    }
}

/// Language model that answers with the prompt it was given
pub struct EchoModel {
    pub calls: AtomicUsize,
}

impl EchoModel {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    async fn complete(&self, prompt: &str, _timeout: Duration) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(prompt.to_string())
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Language model whose backend is down
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String> {
        Err(Error::Llm("connection refused".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Embedder that blocks until released, signalling when it starts
pub struct GatedEmbedder {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl GatedEmbedder {
    pub fn new(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self { entered, release }
    }
}

#[async_trait]
impl Embedder for GatedEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(texts.iter().map(|t| HashingEmbedder::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "hashing-test"
    }
}

/// Language model that never answers in time
pub struct SlowModel;

#[async_trait]
impl LanguageModel for SlowModel {
    async fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

/// Store wrapper whose upserts fail, counting discards
pub struct FailingUpsertStore {
    pub inner: LocalStore,
    pub discards: AtomicUsize,
}

#[async_trait]
impl VectorStore for FailingUpsertStore {
    async fn create(&self, namespace: &str, dimension: usize) -> Result<IndexHandle> {
        self.inner.create(namespace, dimension).await
    }

    async fn open(&self, namespace: &str, collection: &str) -> Result<IndexHandle> {
        self.inner.open(namespace, collection).await
    }

    async fn upsert(&self, _handle: &IndexHandle, _points: Vec<ChunkPoint>) -> Result<()> {
        Err(Error::Index("disk full".to_string()))
    }

    async fn query(&self, handle: &IndexHandle, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.inner.query(handle, vector, top_k).await
    }

    async fn discard(&self, handle: &IndexHandle) -> Result<()> {
        self.discards.fetch_add(1, Ordering::SeqCst);
        self.inner.discard(handle).await
    }

    fn backend_name(&self) -> &str {
        "local"
    }
}

/// Settings with small chunks so short fixtures still split
pub fn test_settings() -> PipelineSettings {
    PipelineSettings {
        top_k: 2,
        chunk: ChunkConfig {
            max_chars: 400,
            overlap_chars: 0,
            prefer_heading_boundaries: true,
            min_chars: 10,
        },
        embedding_batch_size: 8,
        llm_timeout: Duration::from_secs(5),
        ..PipelineSettings::default()
    }
}

/// A pipeline rooted in its own temporary uploads directory
pub struct Fixture {
    pub temp: TempDir,
    pub namespaces: NamespaceStore,
    pub pipeline: Arc<RagPipeline>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(test_settings(), Arc::new(EchoModel::new()))
    }

    pub fn with(settings: PipelineSettings, llm: Arc<dyn LanguageModel>) -> Self {
        Self::with_parts(settings, Arc::new(HashingEmbedder), llm, None)
    }

    pub fn with_parts(
        settings: PipelineSettings,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        store: Option<Arc<dyn VectorStore>>,
    ) -> Self {
        let temp = TempDir::new().unwrap();
        let namespaces = NamespaceStore::new(temp.path().join("uploads"));
        let store = store
            .unwrap_or_else(|| Arc::new(LocalStore::new(namespaces.clone(), "modelrag")));
        let pipeline = Arc::new(RagPipeline::new(
            settings,
            namespaces.clone(),
            Arc::new(DirectoryReader::new()),
            embedder,
            store,
            llm,
        ));
        Self {
            temp,
            namespaces,
            pipeline,
        }
    }

    /// Write a document into a namespace's rag folder
    pub fn write_rag(&self, namespace: &str, name: &str, content: &str) {
        write_file(&self.namespaces.rag_dir(namespace), name, content);
    }

    /// Write a document into a namespace's fine-tune folder
    pub fn write_finetune(&self, namespace: &str, name: &str, content: &str) {
        write_file(&self.namespaces.finetune_dir(namespace), name, content);
    }

    /// Names of the collection directories present for a namespace
    pub fn collections(&self, namespace: &str) -> Vec<String> {
        let dir = self.namespaces.index_dir(namespace);
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Every file of a collection with its bytes, sorted by name
    pub fn collection_files(&self, namespace: &str, collection: &str) -> Vec<(String, Vec<u8>)> {
        let dir = self.namespaces.index_dir(namespace).join(collection);
        let mut files: Vec<(String, Vec<u8>)> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .map(|path| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                (name, std::fs::read(&path).unwrap())
            })
            .collect();
        files.sort();
        files
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
