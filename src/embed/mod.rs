//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait for different embedding backends
//! - An HTTP embedding backend
//! - A local FastEmbed backend (`local-embed` feature)
//! - Batch processing for efficiency

mod http_backend;

#[cfg(feature = "local-embed")]
mod fastembed_impl;

pub use http_backend::*;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.to_lowercase().as_str() {
        "http" => Ok(Arc::new(HttpEmbedder::new(config)?)),
        #[cfg(feature = "local-embed")]
        "fastembed" => Ok(Arc::new(FastEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embed"))]
        "fastembed" => Err(Error::Config(
            "Embedding provider 'fastembed' requires the 'local-embed' feature".to_string(),
        )),
        other => Err(Error::Config(format!(
            "Unsupported embedding provider '{}'",
            other
        ))),
    }
}

/// Embed a single text
pub async fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed(vec![text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("Embedder returned no vector".to_string()))
}

/// Helper to embed in batches, checking that every input got a vector
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());
    let batch_size = batch_size.max(1);

    for (i, chunk) in texts.chunks(batch_size).enumerate() {
        debug!("Embedding batch {} ({} texts)", i + 1, chunk.len());
        let embeddings = embedder.embed(chunk.to_vec()).await?;
        if embeddings.len() != chunk.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunk.len(),
                embeddings.len()
            )));
        }
        all_embeddings.extend(embeddings);
    }

    Ok(all_embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
        short: bool,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let n = if self.short { texts.len() - 1 } else { texts.len() };
            Ok((0..n).map(|i| vec![i as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_batch_splitting() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
            short: false,
        };
        let texts: Vec<String> = (0..10).map(|i| format!("text {}", i)).collect();

        let vectors = embed_in_batches(&embedder, texts, 3).await.unwrap();

        assert_eq!(vectors.len(), 10);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 4); // 3 + 3 + 3 + 1
    }

    #[tokio::test]
    async fn test_batch_count_mismatch_is_error() {
        let embedder = CountingEmbedder {
            calls: AtomicUsize::new(0),
            short: true,
        };
        let texts = vec!["a".to_string(), "b".to_string()];

        let result = embed_in_batches(&embedder, texts, 8).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = EmbeddingConfig {
            provider: "word2vec".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(matches!(create_embedder(&config), Err(Error::Config(_))));
    }
}
