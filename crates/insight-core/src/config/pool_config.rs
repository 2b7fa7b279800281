//! Worker pool configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the detector worker pool.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of workers. Default: available CPU parallelism.
    pub max_workers: Option<usize>,
    /// Per-task timeout in milliseconds. Default: 30,000.
    pub task_timeout_ms: Option<u64>,
    /// Log every dispatch and completion at info level. Default: false.
    pub verbose: Option<bool>,
}

impl PoolConfig {
    /// Returns the effective worker count, matched to the CPU count when unset.
    pub fn effective_max_workers(&self) -> usize {
        self.max_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(constants::DEFAULT_MAX_WORKERS)
        })
    }

    pub fn effective_task_timeout_ms(&self) -> u64 {
        self.task_timeout_ms.unwrap_or(constants::DEFAULT_TASK_TIMEOUT_MS)
    }

    pub fn effective_verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }
}
