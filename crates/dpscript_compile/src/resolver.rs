//! Source text resolution.
//!
//! The compiler never touches storage directly: hosts inject a
//! [`SourceResolver`] (`Arc<dyn SourceResolver + Send + Sync>`) and the
//! session awaits it for every source unit, root and imports alike. These
//! awaits are the pipeline's only suspension points, and the only places
//! cancellation is observed.
//!
//! Two implementations ship with the crate: [`FsResolver`] reads `file://`
//! URIs (or plain paths) through `tokio::fs`, and [`MemoryResolver`] serves
//! from an in-memory map for tests and embedded hosts.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use indexmap::IndexMap;
use url::Url;

/// Failure to produce source text for a source id.
#[derive(Debug)]
pub enum ResolveError {
    NotFound(String),
    InvalidUri(String),
    Io(io::Error),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NotFound(id) => write!(f, "Source not found: {id}"),
            ResolveError::InvalidUri(id) => write!(f, "Invalid source URI: {id}"),
            ResolveError::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<io::Error> for ResolveError {
    fn from(err: io::Error) -> Self {
        ResolveError::Io(err)
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Host-provided source text access. Must be safe for concurrent reads.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn exists(&self, source_id: &str) -> bool;

    async fn get_text(&self, source_id: &str) -> ResolveResult<String>;
}

/// Resolver over an in-memory URI → text map.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    sources: IndexMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_id: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(source_id.into(), text.into());
    }

    /// Builder-style insertion for test setups.
    pub fn with(mut self, source_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(source_id, text);
        self
    }
}

#[async_trait]
impl SourceResolver for MemoryResolver {
    async fn exists(&self, source_id: &str) -> bool {
        self.sources.contains_key(source_id)
    }

    async fn get_text(&self, source_id: &str) -> ResolveResult<String> {
        self.sources
            .get(source_id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(source_id.to_string()))
    }
}

/// Filesystem resolver: accepts `file://` URIs and plain paths.
#[derive(Debug, Clone, Default)]
pub struct FsResolver;

impl FsResolver {
    pub fn new() -> Self {
        FsResolver
    }

    fn to_path(source_id: &str) -> ResolveResult<PathBuf> {
        if source_id.starts_with("file://") {
            let url = Url::parse(source_id)
                .map_err(|_| ResolveError::InvalidUri(source_id.to_string()))?;
            url.to_file_path()
                .map_err(|_| ResolveError::InvalidUri(source_id.to_string()))
        } else {
            Ok(PathBuf::from(source_id))
        }
    }
}

#[async_trait]
impl SourceResolver for FsResolver {
    async fn exists(&self, source_id: &str) -> bool {
        match Self::to_path(source_id) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn get_text(&self, source_id: &str) -> ResolveResult<String> {
        let path = Self::to_path(source_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ResolveError::NotFound(source_id.to_string()))
            }
            Err(err) => Err(ResolveError::Io(err)),
        }
    }
}
