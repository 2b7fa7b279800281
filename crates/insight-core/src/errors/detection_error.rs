//! Detection errors.

use super::error_code::{self, InsightErrorCode};

/// Errors a detector invocation can produce.
///
/// The executors never propagate these; they are folded into the task's
/// result as error strings.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Detector {detector} failed: {message}")]
    Failed { detector: String, message: String },

    #[error("Detector {detector} panicked: {message}")]
    Panicked { detector: String, message: String },

    #[error("Detector {detector} timed out after {timeout_ms}ms")]
    Timeout { detector: String, timeout_ms: u64 },

    #[error("Detector {detector} could not read {path}: {message}")]
    Io {
        detector: String,
        path: String,
        message: String,
    },

    #[error("Detector {detector} cancelled")]
    Cancelled { detector: String },
}

impl DetectionError {
    /// Shorthand for the common "detector reported a failure" case.
    pub fn failed(detector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            detector: detector.into(),
            message: message.into(),
        }
    }
}

impl InsightErrorCode for DetectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => error_code::DETECTOR_TIMEOUT,
            Self::Cancelled { .. } => error_code::CANCELLED,
            _ => error_code::DETECTION_ERROR,
        }
    }
}
