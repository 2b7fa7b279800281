//! In-process executor.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, warn};

use insight_core::events::types::DetectorCrashedEvent;
use insight_core::events::EventDispatcher;
use insight_core::traits::{Cancellable, CancellationToken};

use super::task::{panic_message, run_task, DetectorResult, DetectorTask};
use super::traits::Executor;

/// Runs tasks one at a time on the calling thread, in input order.
///
/// Errors and panics become crashed results and never stop the remaining
/// tasks. Timeouts are not enforced.
#[derive(Debug, Default)]
pub struct SequentialExecutor {
    cancellation: CancellationToken,
    events: EventDispatcher,
}

impl SequentialExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Once cancelled, remaining tasks are reported as cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }
}

impl Executor for SequentialExecutor {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn execute(&mut self, tasks: Vec<DetectorTask>) -> Vec<DetectorResult> {
        debug!(tasks = tasks.len(), "sequential execution");
        tasks
            .iter()
            .map(|task| {
                if self.cancellation.is_cancelled() {
                    return DetectorResult::cancelled(task.detector_name(), task.file(), Default::default());
                }
                let start = Instant::now();
                let token = self.cancellation.clone();
                match panic::catch_unwind(AssertUnwindSafe(|| run_task(task, token))) {
                    Ok(result) => {
                        if result.crashed {
                            warn!(detector = %result.detector, file = %result.file, "detector failed");
                            self.events.emit_detector_crashed(&DetectorCrashedEvent {
                                detector: result.detector.clone(),
                                file: result.file.clone(),
                                message: result.errors.join("; "),
                            });
                        }
                        result
                    }
                    Err(payload) => {
                        let message = format!("detector panicked: {}", panic_message(payload.as_ref()));
                        warn!(detector = task.detector_name(), file = task.file(), %message, "detector panicked");
                        self.events.emit_detector_crashed(&DetectorCrashedEvent {
                            detector: task.detector_name().to_string(),
                            file: task.file().to_string(),
                            message: message.clone(),
                        });
                        DetectorResult::crashed(task.detector_name(), task.file(), message, start.elapsed())
                    }
                }
            })
            .collect()
    }
}
