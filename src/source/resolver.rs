//! Asset resolver collaborator

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Supplies raw audio bytes for a source identifier
///
/// Resolution may fail (missing file, network error); callers recover by
/// substituting synthetic markers.
pub trait AssetResolver: Send + Sync {
    /// Fetch the encoded audio bytes for `source_id`
    fn resolve(&self, source_id: &str) -> Result<Vec<u8>>;

    /// Container hint (file extension) for the decoder
    fn hint(&self, source_id: &str) -> Option<String> {
        Path::new(source_id)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// Resolves source identifiers as filesystem paths
#[derive(Debug, Clone, Default)]
pub struct FileResolver {
    root: Option<PathBuf>,
}

impl FileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Filesystem path for `source_id`, with `~` expanded
    pub fn path_for(&self, source_id: &str) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(source_id).as_ref());

        match &self.root {
            Some(root) if expanded.is_relative() => root.join(expanded),
            _ => expanded,
        }
    }
}

impl AssetResolver for FileResolver {
    fn resolve(&self, source_id: &str) -> Result<Vec<u8>> {
        let path = self.path_for(source_id);
        std::fs::read(&path).with_context(|| format!("Failed to read audio source: {:?}", path))
    }
}
