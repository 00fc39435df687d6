//! Document parsing and text extraction
//!
//! This module handles:
//! - HTML parsing and text extraction
//! - Markdown processing
//! - Plain text normalization
//! - Content type detection

mod html;
mod markdown;
mod text;

pub use html::*;
pub use markdown::*;
pub use text::*;

use crate::error::Result;
use std::path::Path;

/// Bytes inspected when sniffing for binary content
const SNIFF_LEN: usize = 8192;

/// Formats an uploaded file can be read as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Markdown,
    PlainText,
    Pdf,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension
    pub fn from_extension(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return ContentType::Unknown;
        };

        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xhtml" => ContentType::Html,
            "md" | "markdown" | "mdx" => ContentType::Markdown,
            "txt" | "text" | "rst" | "csv" | "tsv" | "log" | "json" | "jsonl" | "yaml" | "yml" => {
                ContentType::PlainText
            }
            "pdf" => ContentType::Pdf,
            _ => ContentType::Unknown,
        }
    }

    /// Detect content type from a MIME essence such as `text/html`
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/html" | "application/xhtml+xml" => ContentType::Html,
            "text/markdown" | "text/x-markdown" => ContentType::Markdown,
            "application/pdf" => ContentType::Pdf,
            e if e.starts_with("text/") => ContentType::PlainText,
            _ => ContentType::Unknown,
        }
    }

    /// Detect from the extension, falling back to the guessed MIME type
    pub fn detect(path: &Path) -> Self {
        match Self::from_extension(path) {
            ContentType::Unknown => mime_guess::from_path(path)
                .iter()
                .map(|m| Self::from_mime(m.essence_str()))
                .find(|t| *t != ContentType::Unknown)
                .unwrap_or(ContentType::Unknown),
            known => known,
        }
    }
}

/// Parsed document with extracted content
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Extracted title (if found)
    pub title: Option<String>,

    /// Main text content
    pub text: String,

    /// Detected content type
    pub content_type: ContentType,

    /// Extracted headings with their levels and positions
    pub headings: Vec<Heading>,
}

/// A heading in the document
#[derive(Debug, Clone)]
pub struct Heading {
    /// Heading level (1-6)
    pub level: u8,

    /// Heading text
    pub text: String,

    /// Byte position in the extracted text
    pub position: usize,
}

impl ParsedDocument {
    pub fn new(text: String, content_type: ContentType) -> Self {
        Self {
            title: None,
            text,
            content_type,
            headings: Vec::new(),
        }
    }

    /// Get the heading trail in effect at a position
    pub fn headings_at_position(&self, position: usize) -> Vec<&Heading> {
        let mut current_levels: Vec<&Heading> = Vec::new();

        for heading in &self.headings {
            if heading.position > position {
                break;
            }

            // Remove headings at same or lower level
            current_levels.retain(|h| h.level < heading.level);
            current_levels.push(heading);
        }

        current_levels
    }
}

/// Parse textual content based on detected type
pub fn parse_content(content: &str, content_type: ContentType) -> Result<ParsedDocument> {
    match content_type {
        ContentType::Html => parse_html(content),
        ContentType::Markdown => parse_markdown(content),
        ContentType::PlainText | ContentType::Pdf | ContentType::Unknown => {
            Ok(parse_plain_text(content))
        }
    }
}

/// A NUL byte near the start marks a file as binary
pub fn is_binary_content(data: &[u8]) -> bool {
    data.iter().take(SNIFF_LEN).any(|&b| b == 0)
}

/// Uploads whose type can never yield text: media, fonts, archives, executables
pub fn should_skip_file(path: &Path) -> bool {
    const OPAQUE_EXTENSIONS: &[&str] = &[
        "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "exe", "dll", "so", "dylib", "bin", "pyc",
        "pyo", "class", "o", "obj", "lock", "safetensors", "gguf", "onnx",
    ];

    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();

    if ext == "pdf" {
        return !cfg!(feature = "pdf");
    }
    if OPAQUE_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }

    mime_guess::from_ext(&ext).first().is_some_and(|m| {
        matches!(
            m.type_().as_str(),
            "image" | "audio" | "video" | "font"
        )
    })
}

/// Collapse runs of spaces to one space and runs of blank lines to one blank line
pub fn normalize_whitespace(text: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(words.join(" "));
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}
