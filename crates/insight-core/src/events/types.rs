//! Event payload types.

use std::path::PathBuf;

/// Payload for `on_analysis_started`.
#[derive(Debug, Clone)]
pub struct AnalysisStartedEvent {
    pub root: PathBuf,
    pub file_count: usize,
    pub force_full: bool,
}

/// Payload for `on_file_routed`.
#[derive(Debug, Clone)]
pub struct FileRoutedEvent {
    pub path: String,
    pub analyzed: bool,
    /// Skip reason; `None` when the file is analyzed.
    pub reason: Option<String>,
}

/// Payload for `on_detector_crashed`.
#[derive(Debug, Clone)]
pub struct DetectorCrashedEvent {
    pub detector: String,
    pub file: String,
    pub message: String,
}

/// Payload for `on_detector_timed_out`.
#[derive(Debug, Clone)]
pub struct DetectorTimedOutEvent {
    pub detector: String,
    pub file: String,
    pub timeout_ms: u64,
}

/// Payload for `on_worker_replaced`.
#[derive(Debug, Clone)]
pub struct WorkerReplacedEvent {
    pub retired_worker: u64,
    pub new_worker: Option<u64>,
    pub reason: String,
}

/// Payload for `on_analysis_complete`.
#[derive(Debug, Clone)]
pub struct AnalysisCompleteEvent {
    pub files_analyzed: usize,
    pub files_skipped: usize,
    pub issue_count: usize,
    pub duration_ms: u64,
}

/// Payload for `on_error`.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
    pub error_code: String,
}
