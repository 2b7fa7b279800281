//! The executor contract.

use std::sync::Arc;
use std::time::Duration;

use insight_core::constants::DEFAULT_TASK_TIMEOUT_MS;

use super::task::{DetectorResult, DetectorTask, TaskPlanner};
use crate::detectors::{Detector, DetectorTarget};

/// Runs detector tasks and returns exactly one result per task, in task order.
pub trait Executor {
    fn name(&self) -> &'static str;

    fn execute(&mut self, tasks: Vec<DetectorTask>) -> Vec<DetectorResult>;

    /// Timeout given to planned tasks whose detector has none of its own.
    fn default_timeout(&self) -> Duration {
        Duration::from_millis(DEFAULT_TASK_TIMEOUT_MS)
    }

    /// Run every detector against every target that allows it.
    fn run(
        &mut self,
        detectors: &[Arc<dyn Detector>],
        targets: &[Arc<DetectorTarget>],
    ) -> Vec<DetectorResult> {
        let tasks = TaskPlanner::new(self.default_timeout()).plan(detectors, targets);
        self.execute(tasks)
    }

    /// Release resources. Idempotent.
    fn shutdown(&mut self) {}
}
