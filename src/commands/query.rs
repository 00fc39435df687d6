//! Query command implementation

use crate::error::Result;
use crate::pipeline::{QueryAnswer, RagPipeline};
use tracing::info;

/// Ask a model a question
pub async fn cmd_query(pipeline: &RagPipeline, model: &str, question: &str) -> Result<QueryAnswer> {
    info!("Querying '{}': {}", model, question);
    pipeline.query(model, question).await
}

/// Print an answer followed by the chunks it drew on
pub fn print_answer(answer: &QueryAnswer) {
    println!("{}", answer.answer.trim());

    if answer.sources.is_empty() {
        return;
    }

    println!("\nSources:");
    for (i, source) in answer.sources.iter().enumerate() {
        println!(
            "  {}. {} (chunk {}, score {:.3})",
            i + 1,
            source.doc_path,
            source.chunk_index,
            source.score
        );
    }
}
