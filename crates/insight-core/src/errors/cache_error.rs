//! Change-detection cache errors.

use std::path::PathBuf;

use super::error_code::{self, InsightErrorCode};

/// Errors from persisting the change-detection cache.
///
/// Loading never fails (a missing or corrupt cache is an empty cache);
/// only writes report errors, and the engine downgrades those to warnings.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error on cache file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize cache: {message}")]
    Serialize { message: String },
}

impl InsightErrorCode for CacheError {
    fn error_code(&self) -> &'static str {
        error_code::CACHE_ERROR
    }
}
