//! Prompt assembly

use crate::config::{CONTEXT_PLACEHOLDER, QUERY_PLACEHOLDER};
use crate::store::ScoredChunk;

/// Join retrieved chunk texts in rank order
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.payload.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fill the template's context and query placeholders in a single pass,
/// so placeholder text inside the context or question is left alone
pub fn render_prompt(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;

    loop {
        let next_context = rest.find(CONTEXT_PLACEHOLDER);
        let next_query = rest.find(QUERY_PLACEHOLDER);

        let (pos, placeholder, value) = match (next_context, next_query) {
            (Some(c), Some(q)) if c < q => (c, CONTEXT_PLACEHOLDER, context),
            (_, Some(q)) => (q, QUERY_PLACEHOLDER, question),
            (Some(c), None) => (c, CONTEXT_PLACEHOLDER, context),
            (None, None) => break,
        };

        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + placeholder.len()..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_prompt_template;
    use crate::store::ChunkPayload;

    fn hit(text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            id: text.to_string(),
            score,
            payload: ChunkPayload {
                namespace: "Astro".to_string(),
                doc_id: "d".to_string(),
                doc_path: "d.txt".to_string(),
                title: None,
                headings: Vec::new(),
                chunk_index: 0,
                text: text.to_string(),
                chunk_hash: "h".to_string(),
            },
        }
    }

    #[test]
    fn test_context_keeps_rank_order() {
        let context = build_context(&[hit("first", 0.9), hit("second", 0.5)]);
        assert_eq!(context, "first\n\nsecond");
    }

    #[test]
    fn test_render_default_template() {
        let prompt = render_prompt(
            &default_prompt_template(),
            "Paris is the capital of France.",
            "What is the capital of France?",
        );

        assert!(prompt.starts_with("Context information is below."));
        assert!(prompt.contains("Paris is the capital of France."));
        assert!(prompt.contains("Query: What is the capital of France?"));
        assert!(prompt.trim_end().ends_with("Answer:"));
        assert!(!prompt.contains(CONTEXT_PLACEHOLDER));
        assert!(!prompt.contains(QUERY_PLACEHOLDER));
    }

    #[test]
    fn test_placeholders_in_values_are_not_expanded() {
        let prompt = render_prompt("{context_str}|{query_str}", "ctx {query_str}", "q");
        assert_eq!(prompt, "ctx {query_str}|q");
    }

    #[test]
    fn test_repeated_placeholders() {
        let prompt = render_prompt("{query_str} {context_str} {query_str}", "c", "q");
        assert_eq!(prompt, "q c q");
    }
}
