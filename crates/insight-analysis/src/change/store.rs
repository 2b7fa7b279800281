//! On-disk cache format: a versioned JSON map of path → entry.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use insight_core::constants::CACHE_FORMAT_VERSION;
use insight_core::errors::CacheError;
use insight_core::types::collections::BTreeMap;

use super::hasher::FileDigest;
use crate::detectors::Issue;

/// Cached analysis state for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub path: String,
    pub hash: FileDigest,
    /// Seconds since the Unix epoch at which the entry was written.
    pub timestamp: u64,
    /// Detector set that produced `issues`, sorted.
    #[serde(default)]
    pub detectors: Vec<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

/// Load the cache. Missing, unreadable, corrupt, or version-mismatched
/// files all load as an empty map.
pub fn load(path: &Path) -> BTreeMap<String, CacheEntry> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no change cache, full analysis");
            return BTreeMap::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "change cache unreadable, ignoring");
            return BTreeMap::new();
        }
    };
    match serde_json::from_str::<CacheFile>(&raw) {
        Ok(file) if file.version == CACHE_FORMAT_VERSION => file.entries,
        Ok(file) => {
            warn!(
                path = %path.display(),
                found = file.version,
                expected = CACHE_FORMAT_VERSION,
                "change cache version mismatch, ignoring"
            );
            BTreeMap::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "change cache corrupt, ignoring");
            BTreeMap::new()
        }
    }
}

/// Rewrite the whole cache through a temp file and rename.
pub fn save(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = CacheFile {
        version: CACHE_FORMAT_VERSION,
        entries: entries.clone(),
    };
    let json = serde_json::to_string(&file).map_err(|e| CacheError::Serialize {
        message: e.to_string(),
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load(&path).is_empty());
    }

    #[test]
    fn wrong_version_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"version": 999, "entries": {}}"#).unwrap();
        assert!(load(&path).is_empty());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state/cache.json");
        let mut entries = BTreeMap::new();
        entries.insert(
            "a.rs".to_string(),
            CacheEntry {
                path: "a.rs".into(),
                hash: FileDigest::of_bytes(b"x"),
                timestamp: 1,
                detectors: vec!["security".into()],
                issues: Vec::new(),
            },
        );
        save(&path, &entries).unwrap();
        assert_eq!(load(&path), entries);
    }
}
