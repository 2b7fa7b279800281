//! InsightEventHandler trait, all methods with no-op defaults.

use super::types::*;

/// Trait for handling Insight events.
///
/// Handlers only override the events they care about. The trait requires
/// `Send + Sync` because the worker pool supervisor emits from the thread
/// that drives a batch, which need not be the thread that built the engine.
pub trait InsightEventHandler: Send + Sync {
    // ---- Run lifecycle ----
    fn on_analysis_started(&self, _event: &AnalysisStartedEvent) {}
    fn on_analysis_complete(&self, _event: &AnalysisCompleteEvent) {}

    // ---- Routing ----
    fn on_file_routed(&self, _event: &FileRoutedEvent) {}

    // ---- Detector health ----
    fn on_detector_crashed(&self, _event: &DetectorCrashedEvent) {}
    fn on_detector_timed_out(&self, _event: &DetectorTimedOutEvent) {}

    // ---- Pool ----
    fn on_worker_replaced(&self, _event: &WorkerReplacedEvent) {}

    // ---- Errors ----
    fn on_error(&self, _event: &ErrorEvent) {}
}
