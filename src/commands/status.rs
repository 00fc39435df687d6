//! Status and model listing commands

use crate::error::{Error, Result};
use crate::namespace::{IndexManifest, NamespaceStore, UploadKind};
use crate::pipeline::{NamespaceStatus, RagPipeline};
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::Path;

/// Status information for one model
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub model: String,
    pub state: String,
    pub rag_files: usize,
    pub finetune_files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexManifest>,
}

/// Report a model's uploads and index state
pub async fn cmd_status(pipeline: &RagPipeline, model: &str) -> Result<StatusInfo> {
    let status = pipeline.status(model).await?;
    let namespaces = pipeline.namespaces();
    if !namespaces.exists(model).await {
        return Err(Error::NamespaceNotFound(model.to_string()));
    }

    let (state, index) = match status {
        NamespaceStatus::NoIndex => ("no_index", None),
        NamespaceStatus::Building => ("building", None),
        NamespaceStatus::Ready(manifest) => ("ready", Some(manifest)),
    };

    Ok(StatusInfo {
        model: model.to_string(),
        state: state.to_string(),
        rag_files: count_files(&namespaces.upload_dir(model, UploadKind::Rag)),
        finetune_files: count_files(&namespaces.upload_dir(model, UploadKind::FineTune)),
        index,
    })
}

/// List model names
pub async fn cmd_models(namespaces: &NamespaceStore) -> Result<Vec<String>> {
    namespaces.list().await
}

/// Count visible files below a directory
fn count_files(dir: &Path) -> usize {
    if !dir.is_dir() {
        return 0;
    }
    WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .count()
}

/// Print status information
pub fn print_status(status: &StatusInfo) {
    println!("Model: {}", status.model);
    println!("  State:           {}", status.state);
    println!("  RAG files:       {}", status.rag_files);
    println!("  Fine-tune files: {}", status.finetune_files);

    if let Some(index) = &status.index {
        println!("\nIndex:");
        println!("  Collection: {} ({})", index.collection, index.backend);
        println!("  Embedding:  {} (dim {})", index.embedding_model, index.dimension);
        println!("  Documents:  {}", index.documents);
        println!("  Chunks:     {}", index.chunks);
        println!("  Created:    {}", index.created_at.to_rfc3339());
    }
}

/// Print model names
pub fn print_models(models: &[String]) {
    if models.is_empty() {
        println!("No models yet. Upload documents to create one.");
        return;
    }
    for model in models {
        println!("{}", model);
    }
}
