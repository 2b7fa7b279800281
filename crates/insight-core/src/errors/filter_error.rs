//! File filter errors.

use std::path::PathBuf;

use super::error_code::{self, InsightErrorCode};

/// Errors raised while building a file filter.
///
/// These only surface at construction time; path checks never fail.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid pattern {pattern:?} from {source_name}: {message}")]
    InvalidPattern {
        pattern: String,
        source_name: String,
        message: String,
    },

    #[error("Failed to read ignore file {path}: {source}")]
    IgnoreFileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl InsightErrorCode for FilterError {
    fn error_code(&self) -> &'static str {
        error_code::FILTER_ERROR
    }
}
