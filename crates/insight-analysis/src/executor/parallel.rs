//! Worker-pool-backed executor.

use std::time::Duration;

use insight_core::errors::PoolError;
use insight_core::events::EventDispatcher;

use super::task::{DetectorResult, DetectorTask};
use super::traits::Executor;
use crate::pool::{PoolStats, ShutdownHandle, WorkerPool, WorkerPoolConfig};

/// Dispatches tasks to a [`WorkerPool`]. Results come back in task order.
#[derive(Debug)]
pub struct ParallelExecutor {
    pool: WorkerPool,
}

impl ParallelExecutor {
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        Ok(Self {
            pool: WorkerPool::new(config)?,
        })
    }

    pub fn with_events(config: WorkerPoolConfig, events: EventDispatcher) -> Result<Self, PoolError> {
        Ok(Self {
            pool: WorkerPool::with_events(config, events)?,
        })
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.pool.shutdown_handle()
    }
}

impl Executor for ParallelExecutor {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn default_timeout(&self) -> Duration {
        self.pool.config().task_timeout
    }

    fn execute(&mut self, tasks: Vec<DetectorTask>) -> Vec<DetectorResult> {
        self.pool.run_batch(tasks)
    }

    fn shutdown(&mut self) {
        self.pool.shutdown();
    }
}
