//! Pipeline errors.

use super::error_code::InsightErrorCode;
use super::{CacheError, ConfigError, DetectionError, FilterError, PoolError};

/// Errors surfaced at the engine boundary.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl InsightErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Filter(e) => e.error_code(),
            Self::Detection(e) => e.error_code(),
            Self::Pool(e) => e.error_code(),
            Self::Cache(e) => e.error_code(),
        }
    }
}
