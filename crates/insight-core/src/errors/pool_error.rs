//! Worker pool errors.

use super::error_code::{self, InsightErrorCode};

/// Errors raised by the worker pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Invalid pool size {max_workers}: must be at least 1")]
    InvalidSize { max_workers: usize },

    #[error("Invalid task timeout: must be greater than 0ms")]
    InvalidTimeout,

    #[error("Failed to spawn worker {worker_id}: {source}")]
    SpawnFailed {
        worker_id: u64,
        source: std::io::Error,
    },

    #[error("Worker pool is shut down")]
    ShutDown,
}

impl InsightErrorCode for PoolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ShutDown => error_code::CANCELLED,
            _ => error_code::POOL_ERROR,
        }
    }
}
