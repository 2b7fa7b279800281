//! Change detection: which files differ from the last run.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use insight_core::errors::CacheError;
use insight_core::tracing::metrics;
use insight_core::types::collections::BTreeMap;

use super::hasher::FileDigest;
use super::store::{self, CacheEntry};

/// Whether a file needs analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    /// Not in the cache.
    Added,
    /// Content or detector set differs, or the file is unreadable.
    Modified,
    Unchanged,
}

impl ChangeStatus {
    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeStats {
    pub files_hashed: usize,
    pub unreadable: usize,
    pub added: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub hashing_ms: u64,
    pub cached_entries: usize,
}

/// Owns the persisted path → digest cache for one workspace.
///
/// The cache is read once by [`load`](Self::load) and written once by
/// [`commit`](Self::commit). Concurrent runs on the same cache are
/// last-write-wins.
#[derive(Debug)]
pub struct ChangeDetector {
    root: PathBuf,
    cache_path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    loaded: bool,
    stats: ChangeStats,
}

impl ChangeDetector {
    pub fn new(root: impl Into<PathBuf>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_path: cache_path.into(),
            entries: BTreeMap::new(),
            loaded: false,
            stats: ChangeStats::default(),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Read the cache from disk. Later calls are no-ops.
    pub fn load(&mut self) {
        if self.loaded {
            return;
        }
        self.entries = store::load(&self.cache_path);
        self.loaded = true;
        self.stats.cached_entries = self.entries.len();
        debug!(entries = self.entries.len(), "change cache loaded");
    }

    /// Resolve a workspace-relative path against the root.
    fn absolute(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    /// Content digest of one file. Stable for unmodified content.
    pub fn hash(&self, path: &str) -> FileDigest {
        FileDigest::of_file(&self.absolute(path))
    }

    /// Digests for many files, computed concurrently. Output order matches input.
    pub fn hash_many(&mut self, paths: &[String]) -> Vec<FileDigest> {
        let start = Instant::now();
        let this = &*self;
        let digests: Vec<FileDigest> = paths.par_iter().map(|p| this.hash(p)).collect();
        self.stats.files_hashed += digests.len();
        self.stats.unreadable += digests.iter().filter(|d| d.is_empty()).count();
        let elapsed = start.elapsed().as_millis() as u64;
        self.stats.hashing_ms += elapsed;
        debug!(
            files = digests.len(),
            { metrics::HASHING_DURATION } = elapsed,
            "hashed files"
        );
        digests
    }

    /// Compare a fresh digest (and the detector set about to run) against
    /// the cache. An empty digest is always a change.
    pub fn status(&mut self, path: &str, digest: &FileDigest, detectors: &[&str]) -> ChangeStatus {
        let status = match self.entries.get(path) {
            None => ChangeStatus::Added,
            Some(_) if digest.is_empty() => ChangeStatus::Modified,
            Some(entry) if entry.hash != *digest => ChangeStatus::Modified,
            Some(entry) if !same_detectors(&entry.detectors, detectors) => ChangeStatus::Modified,
            Some(_) => ChangeStatus::Unchanged,
        };
        match status {
            ChangeStatus::Added => self.stats.added += 1,
            ChangeStatus::Modified => self.stats.modified += 1,
            ChangeStatus::Unchanged => self.stats.unchanged += 1,
        }
        status
    }

    pub fn cached(&self, path: &str) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    /// Apply this run's updates and invalidations, prune entries for files
    /// that no longer exist, and rewrite the cache in full.
    pub fn commit(
        &mut self,
        updates: Vec<CacheEntry>,
        invalidated: &[String],
    ) -> Result<(), CacheError> {
        for path in invalidated {
            self.entries.remove(path);
        }
        for entry in updates {
            self.entries.insert(entry.path.clone(), entry);
        }
        let root = self.root.clone();
        let before = self.entries.len();
        self.entries.retain(|path, _| {
            let p = Path::new(path);
            if p.is_absolute() {
                p.exists()
            } else {
                root.join(p).exists()
            }
        });
        store::save(&self.cache_path, &self.entries)?;
        info!(
            entries = self.entries.len(),
            pruned = before - self.entries.len(),
            path = %self.cache_path.display(),
            "change cache written"
        );
        Ok(())
    }

    pub fn stats(&self) -> &ChangeStats {
        &self.stats
    }

    /// Reset per-run counters.
    pub fn reset_stats(&mut self) {
        self.stats = ChangeStats {
            cached_entries: self.entries.len(),
            ..Default::default()
        };
    }
}

/// Build a fresh cache entry stamped with the current time.
pub fn entry_now(
    path: String,
    hash: FileDigest,
    detectors: &[&str],
    issues: Vec<crate::detectors::Issue>,
) -> CacheEntry {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut detectors: Vec<String> = detectors.iter().map(|d| d.to_string()).collect();
    detectors.sort();
    CacheEntry {
        path,
        hash,
        timestamp,
        detectors,
        issues,
    }
}

fn same_detectors(cached: &[String], current: &[&str]) -> bool {
    if cached.len() != current.len() {
        return false;
    }
    let mut current: Vec<&str> = current.to_vec();
    current.sort_unstable();
    cached.iter().zip(current).all(|(a, b)| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn new_file_is_added_then_unchanged_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        let cache = dir.path().join(".insight/cache.json");

        let mut cd = ChangeDetector::new(dir.path(), &cache);
        cd.load();
        let digest = cd.hash("a.rs");
        assert_eq!(cd.status("a.rs", &digest, &["security"]), ChangeStatus::Added);
        cd.commit(
            vec![entry_now("a.rs".into(), digest.clone(), &["security"], vec![])],
            &[],
        )
        .unwrap();

        let mut cd = ChangeDetector::new(dir.path(), &cache);
        cd.load();
        let digest = cd.hash("a.rs");
        assert_eq!(cd.status("a.rs", &digest, &["security"]), ChangeStatus::Unchanged);
        assert_eq!(
            cd.status("a.rs", &digest, &["security", "complexity"]),
            ChangeStatus::Modified
        );
    }

    #[test]
    fn unreadable_file_is_always_changed() {
        let dir = tempfile::tempdir().unwrap();
        let mut cd = ChangeDetector::new(dir.path(), dir.path().join("c.json"));
        cd.load();
        cd.entries.insert(
            "gone.rs".into(),
            entry_now("gone.rs".into(), FileDigest::empty(), &[], vec![]),
        );
        let digest = cd.hash("gone.rs");
        assert!(digest.is_empty());
        assert!(cd.status("gone.rs", &digest, &[]).is_changed());
    }

    #[test]
    fn commit_prunes_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.rs"), "x").unwrap();
        let mut cd = ChangeDetector::new(dir.path(), dir.path().join("c.json"));
        cd.load();
        cd.commit(
            vec![
                entry_now("keep.rs".into(), FileDigest::of_bytes(b"x"), &[], vec![]),
                entry_now("deleted.rs".into(), FileDigest::of_bytes(b"y"), &[], vec![]),
            ],
            &[],
        )
        .unwrap();
        assert!(cd.cached("keep.rs").is_some());
        assert!(cd.cached("deleted.rs").is_none());
    }

    #[test]
    fn hash_many_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), "1").unwrap();
        fs::write(dir.path().join("b"), "2").unwrap();
        let mut cd = ChangeDetector::new(dir.path(), dir.path().join("c.json"));
        let paths = vec!["b".to_string(), "missing".to_string(), "a".to_string()];
        let digests = cd.hash_many(&paths);
        assert_eq!(digests[0], FileDigest::of_bytes(b"2"));
        assert!(digests[1].is_empty());
        assert_eq!(digests[2], FileDigest::of_bytes(b"1"));
        assert_eq!(cd.stats().unreadable, 1);
    }
}
