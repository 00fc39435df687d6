//! Build command implementation

use crate::error::Result;
use crate::pipeline::{BuildOutcome, RagPipeline};
use serde::Serialize;

/// Summary of a build call
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub model: String,
    pub created: bool,
    pub location: String,
    pub collection: String,
    pub backend: String,
    pub documents: usize,
    pub chunks: usize,
}

/// Build the index for a model from its uploaded documents
pub async fn cmd_build(pipeline: &RagPipeline, model: &str) -> Result<BuildReport> {
    let outcome = pipeline.build(model).await?;
    Ok(BuildReport::from_outcome(model, &outcome))
}

impl BuildReport {
    pub fn from_outcome(model: &str, outcome: &BuildOutcome) -> Self {
        let manifest = outcome.manifest();
        Self {
            model: model.to_string(),
            created: outcome.is_created(),
            location: outcome.location().display().to_string(),
            collection: manifest.collection.clone(),
            backend: manifest.backend.clone(),
            documents: manifest.documents,
            chunks: manifest.chunks,
        }
    }
}

/// Print a build summary
pub fn print_build_report(report: &BuildReport) {
    if report.created {
        println!("✓ RAG pipeline created for '{}'", report.model);
    } else {
        println!("✓ RAG pipeline already exists for '{}'", report.model);
    }
    println!("  Manifest:   {}", report.location);
    println!("  Collection: {} ({})", report.collection, report.backend);
    println!("  Documents:  {}", report.documents);
    println!("  Chunks:     {}", report.chunks);
}
