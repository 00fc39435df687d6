//! Text chunking with structure awareness
//!
//! This module handles splitting documents into chunks while:
//! - Respecting heading boundaries when possible
//! - Keeping fenced code blocks intact where the window allows
//! - Providing stable, deterministic chunk boundaries
//! - Computing content hashes used for point identifiers

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use crate::parse::{Heading, ParsedDocument};
use blake3::Hasher;

/// A text chunk with metadata
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// The actual text content
    pub text: String,

    /// Byte start position in original document
    pub char_start: usize,

    /// Byte end position in original document
    pub char_end: usize,

    /// Chunk index (0-based)
    pub index: usize,

    /// Headings that apply to this chunk
    pub headings: Vec<String>,

    /// Blake3 hash of the chunk text, salted with the document hash
    pub hash: String,
}

impl TextChunk {
    /// Compute the hash for this chunk
    pub fn compute_hash(text: &str, doc_hash: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(doc_hash.as_bytes());
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Chunk a parsed document
pub fn chunk_document(doc: &ParsedDocument, doc_hash: &str, config: &ChunkConfig) -> Vec<TextChunk> {
    let text = &doc.text;

    if text.trim().is_empty() {
        return Vec::new();
    }

    let break_points = find_break_points(text, &doc.headings, config);
    let code_blocks = find_code_blocks(text);

    let mut chunks = Vec::new();
    let mut current_start = 0;

    while current_start < text.len() {
        let target_end = current_start + config.max_chars;

        let chunk_end = if target_end >= text.len() {
            text.len()
        } else {
            find_best_break(text, current_start, target_end, &break_points, &code_blocks, config)
        };

        let chunk_end = if chunk_end <= current_start {
            next_char_boundary(text, current_start + 1)
        } else {
            chunk_end
        };

        let chunk_text = text[current_start..chunk_end].trim().to_string();

        // Skip if too small (unless it's the last chunk)
        let is_last = chunk_end >= text.len();
        if !chunk_text.is_empty() && (chunk_text.len() >= config.min_chars || is_last || chunks.is_empty()) {
            let headings = doc
                .headings_at_position(current_start)
                .iter()
                .map(|h| h.text.clone())
                .collect();

            let hash = TextChunk::compute_hash(&chunk_text, doc_hash);

            chunks.push(TextChunk {
                text: chunk_text,
                char_start: current_start,
                char_end: chunk_end,
                index: chunks.len(),
                headings,
                hash,
            });
        }

        if is_last {
            break;
        }

        // Step back by the overlap, but always make progress
        let next_start = if chunk_end > config.overlap_chars {
            ensure_char_boundary(text, chunk_end - config.overlap_chars)
        } else {
            chunk_end
        };
        current_start = if next_start <= current_start {
            chunk_end
        } else {
            next_start
        };
    }

    chunks
}

/// Find potential break points in the text
fn find_break_points(text: &str, headings: &[Heading], config: &ChunkConfig) -> Vec<BreakPoint> {
    let mut points = Vec::new();

    if config.prefer_heading_boundaries {
        for heading in headings {
            if heading.position < text.len() && text.is_char_boundary(heading.position) {
                points.push(BreakPoint::new(heading.position, BreakPriority::Heading));
            }
        }
    }

    for (i, _) in text.match_indices("\n\n") {
        points.push(BreakPoint::new(i + 2, BreakPriority::Paragraph));
    }

    for pattern in [". ", ".\n", "? ", "! "] {
        for (i, _) in text.match_indices(pattern) {
            points.push(BreakPoint::new(i + 2, BreakPriority::Sentence));
        }
    }

    points.retain(|p| p.position <= text.len() && text.is_char_boundary(p.position));
    // Keep the highest priority for each position
    points.sort_by(|a, b| a.position.cmp(&b.position).then(b.priority.cmp(&a.priority)));
    points.dedup_by_key(|p| p.position);

    points
}

/// Move a position backwards onto a valid UTF-8 character boundary
fn ensure_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut adjusted = pos;
    while adjusted > 0 && !text.is_char_boundary(adjusted) {
        adjusted -= 1;
    }
    adjusted
}

/// Move a position forwards onto a valid UTF-8 character boundary
fn next_char_boundary(text: &str, pos: usize) -> usize {
    let mut adjusted = pos.min(text.len());
    while adjusted < text.len() && !text.is_char_boundary(adjusted) {
        adjusted += 1;
    }
    adjusted
}

/// Find the best break point near the target position
fn find_best_break(
    text: &str,
    start: usize,
    target: usize,
    break_points: &[BreakPoint],
    code_blocks: &[(usize, usize)],
    config: &ChunkConfig,
) -> usize {
    // Search window: 80% to 120% of target chunk size
    let min_pos = ensure_char_boundary(text, start + (config.max_chars * 4 / 5));
    let max_pos = ensure_char_boundary(text, start + (config.max_chars * 6 / 5));

    let best = break_points
        .iter()
        .filter(|p| p.position > start && p.position >= min_pos && p.position <= max_pos)
        .filter(|p| !is_in_code_block(p.position, code_blocks))
        .max_by_key(|p| (p.priority, std::cmp::Reverse(p.position.abs_diff(target))));

    if let Some(best) = best {
        return best.position;
    }

    // Fall back to a word boundary before the target
    let search_start = ensure_char_boundary(text, min_pos.max(start));
    let search_end = ensure_char_boundary(text, target.min(text.len()));
    if search_start < search_end {
        if let Some(i) = text[search_start..search_end].rfind(' ') {
            let pos = search_start + i + 1;
            if pos > start {
                return pos;
            }
        }
    }

    ensure_char_boundary(text, target)
}

/// Compute a stable hash for document content
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}

/// Compute a stable hash for a string
pub fn compute_text_hash(text: &str) -> String {
    compute_content_hash(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ContentType;

    fn make_test_doc(text: &str) -> ParsedDocument {
        ParsedDocument::new(text.to_string(), ContentType::PlainText)
    }

    fn default_chunk_config() -> ChunkConfig {
        ChunkConfig {
            max_chars: 500,
            overlap_chars: 50,
            prefer_heading_boundaries: true,
            min_chars: 50,
        }
    }

    #[test]
    fn test_chunk_short_document() {
        let doc = make_test_doc("This is a short document.");
        let config = default_chunk_config();
        let doc_hash = compute_text_hash(&doc.text);

        let chunks = chunk_document(&doc, &doc_hash, &config);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "This is a short document.");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_chunk_empty_document() {
        let doc = make_test_doc("   ");
        assert!(chunk_document(&doc, "h", &default_chunk_config()).is_empty());
    }

    #[test]
    fn test_chunk_long_document() {
        let text = "Lorem ipsum dolor sit amet. ".repeat(100);
        let doc = make_test_doc(&text);
        let config = default_chunk_config();
        let doc_hash = compute_text_hash(&doc.text);

        let chunks = chunk_document(&doc, &doc_hash, &config);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.len() <= config.max_chars * 6 / 5);
        }
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
        // Consecutive chunks overlap
        assert!(chunks[1].char_start < chunks[0].char_end);
    }

    #[test]
    fn test_chunk_terminates_with_large_overlap() {
        let text = "abcdefghij".repeat(50);
        let doc = make_test_doc(&text);
        let config = ChunkConfig {
            max_chars: 100,
            overlap_chars: 95,
            prefer_heading_boundaries: false,
            min_chars: 10,
        };

        let chunks = chunk_document(&doc, "h", &config);
        assert!(!chunks.is_empty());
        assert_eq!(chunks.last().unwrap().char_end, text.len());
    }

    #[test]
    fn test_chunk_multibyte_text() {
        let text = "Ça va très bien, merci. ".repeat(80);
        let doc = make_test_doc(&text);
        let config = ChunkConfig {
            max_chars: 97,
            overlap_chars: 13,
            prefer_heading_boundaries: false,
            min_chars: 5,
        };

        let chunks = chunk_document(&doc, "h", &config);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_chunk_hash_stability() {
        let doc = make_test_doc("Test content for hashing.");
        let config = default_chunk_config();
        let doc_hash = compute_text_hash(&doc.text);

        let chunks1 = chunk_document(&doc, &doc_hash, &config);
        let chunks2 = chunk_document(&doc, &doc_hash, &config);

        assert_eq!(chunks1[0].hash, chunks2[0].hash);
    }

    #[test]
    fn test_content_hash() {
        let hash1 = compute_text_hash("hello world");
        let hash2 = compute_text_hash("hello world");
        let hash3 = compute_text_hash("different content");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_chunk_with_headings() {
        let text = format!(
            "Title\n\n{}\n\nSection\n\n{}",
            "Intro sentence. ".repeat(8),
            "Body sentence. ".repeat(8)
        );
        let section_pos = text.find("Section").unwrap();
        let mut doc = make_test_doc(&text);
        doc.headings = vec![
            Heading { level: 1, text: "Title".to_string(), position: 0 },
            Heading { level: 2, text: "Section".to_string(), position: section_pos },
        ];

        let config = ChunkConfig {
            max_chars: 150,
            overlap_chars: 0,
            prefer_heading_boundaries: true,
            min_chars: 10,
        };
        let doc_hash = compute_text_hash(&doc.text);

        let chunks = chunk_document(&doc, &doc_hash, &config);

        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0].headings, vec!["Title".to_string()]);
        let last = chunks.last().unwrap();
        assert_eq!(last.headings, vec!["Title".to_string(), "Section".to_string()]);
    }
}
