//! Worker pool configuration.

use std::time::Duration;

use insight_core::config::PoolConfig;
use insight_core::errors::PoolError;

/// Resolved pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    pub max_workers: usize,
    pub task_timeout: Duration,
    /// Log each dispatch and completion at info level.
    pub verbose: bool,
    /// Dispatch higher-risk targets first (stable within a tier).
    pub priority_dispatch: bool,
}

impl WorkerPoolConfig {
    pub fn new(max_workers: usize, task_timeout: Duration) -> Self {
        Self {
            max_workers,
            task_timeout,
            verbose: false,
            priority_dispatch: false,
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self {
            max_workers: config.effective_max_workers(),
            task_timeout: Duration::from_millis(config.effective_task_timeout_ms()),
            verbose: config.effective_verbose(),
            priority_dispatch: false,
        }
    }

    pub fn with_priority_dispatch(mut self, enabled: bool) -> Self {
        self.priority_dispatch = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_workers == 0 {
            return Err(PoolError::InvalidSize {
                max_workers: self.max_workers,
            });
        }
        if self.task_timeout.is_zero() {
            return Err(PoolError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::from_config(&PoolConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_is_invalid() {
        let err = WorkerPoolConfig::new(0, Duration::from_secs(1))
            .validate()
            .unwrap_err();
        assert!(matches!(err, PoolError::InvalidSize { max_workers: 0 }));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let err = WorkerPoolConfig::new(2, Duration::ZERO).validate().unwrap_err();
        assert!(matches!(err, PoolError::InvalidTimeout));
    }

    #[test]
    fn defaults_are_valid() {
        assert!(WorkerPoolConfig::default().validate().is_ok());
    }
}
