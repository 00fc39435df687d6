//! Document ingestion
//!
//! Reads an upload directory into parsed text documents. Files are visited in
//! sorted order so repeated reads of the same tree yield the same sequence.

use crate::chunk::compute_content_hash;
use crate::error::{Error, Result};
use crate::parse::{is_binary_content, parse_content, should_skip_file, ContentType, ParsedDocument};
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Options for a directory read
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Skip dotfiles and dot-directories
    pub exclude_hidden: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            exclude_hidden: true,
        }
    }
}

/// A document read from disk
#[derive(Debug, Clone)]
pub struct Document {
    /// Stable identifier derived from the relative path
    pub id: Uuid,

    /// Absolute or caller-relative path of the source file
    pub source_path: PathBuf,

    /// Path relative to the directory that was read, with forward slashes
    pub relative_path: String,

    /// Extracted text and structure
    pub content: ParsedDocument,

    /// Blake3 hash of the raw file bytes
    pub content_hash: String,
}

impl Document {
    /// Title for display, falling back to the file name
    pub fn title(&self) -> String {
        self.content.title.clone().unwrap_or_else(|| {
            self.source_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| self.relative_path.clone())
        })
    }
}

/// Trait for document sources
#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Read every usable document under a directory
    async fn read_documents(&self, dir: &Path, options: &ReadOptions) -> Result<Vec<Document>>;
}

/// Reads documents from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct DirectoryReader;

impl DirectoryReader {
    pub fn new() -> Self {
        Self
    }

    /// Collect candidate files under a directory
    fn collect_files(dir: &Path, options: &ReadOptions) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(dir);
        builder
            .hidden(options.exclude_hidden)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        if !options.recursive {
            builder.max_depth(Some(1));
        }

        let mut files = Vec::new();
        for entry in builder.build() {
            match entry {
                Ok(e) if e.file_type().map(|t| t.is_file()).unwrap_or(false) => {
                    let path = e.path().to_path_buf();
                    if should_skip_file(&path) {
                        debug!("Skipping unsupported file: {:?}", path);
                    } else {
                        files.push(path);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to read directory entry: {}", e),
            }
        }

        files
    }

    /// Read and parse a single file; `Ok(None)` when it holds no usable text
    fn read_file(root: &Path, path: &Path) -> Result<Option<Document>> {
        let bytes = std::fs::read(path)?;
        let content_type = ContentType::detect(path);

        let content = match content_type {
            ContentType::Pdf => extract_pdf(&bytes)?,
            _ => {
                if is_binary_content(&bytes) {
                    debug!("Skipping binary file: {:?}", path);
                    return Ok(None);
                }
                let text = String::from_utf8_lossy(&bytes);
                parse_content(&text, content_type)?
            }
        };

        if content.text.trim().is_empty() {
            debug!("Skipping empty document: {:?}", path);
            return Ok(None);
        }

        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        Ok(Some(Document {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, relative_path.as_bytes()),
            source_path: path.to_path_buf(),
            relative_path,
            content,
            content_hash: compute_content_hash(&bytes),
        }))
    }

    fn read_all(dir: &Path, options: &ReadOptions) -> Result<Vec<Document>> {
        if !dir.is_dir() {
            return Err(Error::Ingest(format!(
                "Not a directory: {}",
                dir.display()
            )));
        }

        let files = Self::collect_files(dir, options);
        debug!("Found {} candidate files in {:?}", files.len(), dir);

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            match Self::read_file(dir, &path) {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => {}
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        info!("Read {} documents from {}", documents.len(), dir.display());
        Ok(documents)
    }
}

#[async_trait]
impl DocumentReader for DirectoryReader {
    async fn read_documents(&self, dir: &Path, options: &ReadOptions) -> Result<Vec<Document>> {
        let dir = dir.to_path_buf();
        let options = *options;
        tokio::task::spawn_blocking(move || Self::read_all(&dir, &options))
            .await
            .map_err(|e| Error::Ingest(format!("Reader task failed: {}", e)))?
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<ParsedDocument> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Parse(format!("PDF extraction failed: {}", e)))?;
    let mut doc = crate::parse::parse_plain_text(&text);
    doc.content_type = ContentType::Pdf;
    Ok(doc)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> Result<ParsedDocument> {
    Err(Error::Parse(
        "PDF support requires the 'pdf' feature".to_string(),
    ))
}
