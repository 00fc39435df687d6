//! Per-model directory layout
//!
//! Every model name (namespace) owns one directory under the uploads root:
//!
//! ```text
//! <uploads>/<model>/rag/         documents indexed for retrieval
//! <uploads>/<model>/finetune/    documents kept for fine-tuning
//! <uploads>/<model>/index/       local vector collections
//! <uploads>/<model>/index.json   manifest of the committed index
//! ```
//!
//! The manifest is the only marker of a finished build. It is written last,
//! through a temporary file and a rename, so readers either see a complete
//! manifest or none at all.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

const RAG_DIR: &str = "rag";
const FINETUNE_DIR: &str = "finetune";
const INDEX_DIR: &str = "index";
const MANIFEST_FILE: &str = "index.json";

/// Which upload list a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Rag,
    FineTune,
}

impl UploadKind {
    fn dir_name(self) -> &'static str {
        match self {
            UploadKind::Rag => RAG_DIR,
            UploadKind::FineTune => FINETUNE_DIR,
        }
    }
}

/// Record of a committed index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Collection holding the vectors
    pub collection: String,
    /// Vector store backend that owns the collection
    pub backend: String,
    /// Embedding model used at build time
    pub embedding_model: String,
    /// Vector dimension
    pub dimension: usize,
    /// Number of documents ingested
    pub documents: usize,
    /// Number of chunks stored
    pub chunks: usize,
    /// When the index was committed
    pub created_at: DateTime<Utc>,
}

fn namespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_\-][A-Za-z0-9_.\-]{0,63}$").expect("namespace pattern is valid")
    })
}

/// Check a model name against the allowed alphabet
pub fn validate_namespace(name: &str) -> Result<()> {
    if namespace_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidNamespace(name.to_string()))
    }
}

/// Turn a client-supplied file name into a safe relative path.
///
/// Directory uploads send names like `docs/guide/intro.md`; the structure
/// is kept, but `..`, `.`, roots and drive prefixes are dropped.
pub fn sanitize_upload_path(name: &str) -> Result<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut clean = PathBuf::new();

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                return Err(Error::InvalidRequest(format!(
                    "File name must not contain '..': {}",
                    name
                )))
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(Error::InvalidRequest(format!("Invalid file name: '{}'", name)));
    }

    Ok(clean)
}

/// Filesystem view of all namespaces
#[derive(Debug, Clone)]
pub struct NamespaceStore {
    root: PathBuf,
}

impl NamespaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the uploads root if missing
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    pub fn rag_dir(&self, namespace: &str) -> PathBuf {
        self.namespace_dir(namespace).join(RAG_DIR)
    }

    pub fn finetune_dir(&self, namespace: &str) -> PathBuf {
        self.namespace_dir(namespace).join(FINETUNE_DIR)
    }

    pub fn upload_dir(&self, namespace: &str, kind: UploadKind) -> PathBuf {
        self.namespace_dir(namespace).join(kind.dir_name())
    }

    pub fn index_dir(&self, namespace: &str) -> PathBuf {
        self.namespace_dir(namespace).join(INDEX_DIR)
    }

    pub fn manifest_path(&self, namespace: &str) -> PathBuf {
        self.namespace_dir(namespace).join(MANIFEST_FILE)
    }

    /// Create the namespace directory with its rag and finetune folders
    pub async fn create(&self, namespace: &str) -> Result<PathBuf> {
        validate_namespace(namespace)?;
        let dir = self.namespace_dir(namespace);
        tokio::fs::create_dir_all(dir.join(RAG_DIR)).await?;
        tokio::fs::create_dir_all(dir.join(FINETUNE_DIR)).await?;
        debug!("Namespace directories ready at {:?}", dir);
        Ok(dir)
    }

    pub async fn exists(&self, namespace: &str) -> bool {
        tokio::fs::metadata(self.namespace_dir(namespace))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// List namespace names (subdirectories of the root), sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Save one uploaded file, returning its stored relative name
    pub async fn save_upload(
        &self,
        namespace: &str,
        kind: UploadKind,
        file_name: &str,
        contents: &[u8],
    ) -> Result<String> {
        validate_namespace(namespace)?;
        let relative = sanitize_upload_path(file_name)?;
        let path = self.upload_dir(namespace, kind).join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        debug!("Saved {} bytes to {:?}", contents.len(), path);

        Ok(relative.to_string_lossy().replace('\\', "/"))
    }

    /// Read the committed-index manifest, if any
    pub async fn read_manifest(&self, namespace: &str) -> Result<Option<IndexManifest>> {
        let path = self.manifest_path(namespace);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Commit a manifest: write to a temporary file, then rename over the target
    pub async fn write_manifest(&self, namespace: &str, manifest: &IndexManifest) -> Result<PathBuf> {
        let path = self.manifest_path(namespace);
        let tmp = path.with_extension("json.tmp");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(manifest)?;
        tokio::fs::write(&tmp, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        info!(
            "Committed index manifest for '{}' ({} chunks)",
            namespace, manifest.chunks
        );
        Ok(path)
    }
}
