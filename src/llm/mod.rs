//! Answer generation
//!
//! The pipeline talks to language models through `LanguageModel`; the only
//! shipped implementation is the Ollama HTTP client.

mod ollama;

pub use ollama::*;

use crate::config::LlmConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for text completion providers
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt, failing with `Error::Timeout` once `timeout` elapses
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create the language model client from configuration
pub fn create_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    Ok(Arc::new(OllamaClient::new(&config.url, &config.model)?))
}
