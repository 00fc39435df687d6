//! Break point detection for chunking

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// Word boundary (lowest)
    Word = 1,
    /// Sentence boundary
    Sentence = 2,
    /// Paragraph boundary
    Paragraph = 3,
    /// Heading boundary (highest)
    Heading = 4,
}

/// A potential break point in text
#[derive(Debug, Clone)]
pub struct BreakPoint {
    /// Byte position
    pub position: usize,
    /// Priority of this break point
    pub priority: BreakPriority,
}

impl BreakPoint {
    pub fn new(position: usize, priority: BreakPriority) -> Self {
        Self { position, priority }
    }
}

/// Detect fenced code block spans (byte ranges to avoid breaking)
pub fn find_code_blocks(text: &str) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut block_start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            if in_block {
                blocks.push((block_start, offset + line.len()));
                in_block = false;
            } else {
                block_start = offset;
                in_block = true;
            }
        }
        offset += line.len();
    }

    // An unterminated fence runs to the end of the text
    if in_block {
        blocks.push((block_start, text.len()));
    }

    blocks
}

/// Check if a position is strictly inside a code block
pub fn is_in_code_block(position: usize, code_blocks: &[(usize, usize)]) -> bool {
    code_blocks
        .iter()
        .any(|(start, end)| position > *start && position < *end)
}
