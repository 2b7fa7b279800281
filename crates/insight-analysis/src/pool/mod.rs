//! Bounded worker pool with per-task timeouts and crash recovery.
//!
//! Each worker is a named OS thread fed through its own one-slot channel, so
//! a worker never holds more than one task. Workers report back on a shared
//! event channel. The supervisor ([`WorkerPool::run_batch`]) enforces deadlines
//! and replaces workers that hang or die.

pub mod config;
pub mod stats;
mod worker;
pub mod worker_pool;

pub use config::WorkerPoolConfig;
pub use stats::PoolStats;
pub use worker_pool::{ShutdownHandle, WorkerPool};
