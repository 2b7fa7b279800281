//! Change-detection cache configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the persisted change-detection cache.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file path, relative to the workspace root unless absolute.
    /// Default: `.insight/cache.json`.
    pub path: Option<String>,
}

impl CacheConfig {
    /// Resolve the cache file location against `root`.
    pub fn effective_path(&self, root: &Path) -> PathBuf {
        let raw = self
            .path
            .as_deref()
            .unwrap_or(constants::DEFAULT_CACHE_FILE);
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}
