//! Executors: strategies for running every applicable detector over every
//! target. Both produce exactly one [`DetectorResult`] per task.

pub mod parallel;
pub mod sequential;
pub mod task;
pub mod traits;

pub use parallel::ParallelExecutor;
pub use sequential::SequentialExecutor;
pub use task::{run_task, DetectorResult, DetectorTask, TaskPlanner};
pub use traits::Executor;
