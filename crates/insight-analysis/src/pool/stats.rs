//! Pool counters.

use serde::Serialize;

/// Cumulative counters over the pool's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub tasks_dispatched: u64,
    pub tasks_completed: u64,
    pub tasks_crashed: u64,
    pub tasks_timed_out: u64,
    pub tasks_cancelled: u64,
    pub workers_spawned: u64,
    pub workers_replaced: u64,
    pub active_workers: usize,
}
