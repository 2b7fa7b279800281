//! InsightErrorCode trait for structured error reporting.

/// Every error enum implements this to expose a stable, machine-readable
/// code alongside its human-readable message.
pub trait InsightErrorCode {
    /// Returns the error code string (e.g., "FILTER_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const FILTER_ERROR: &str = "FILTER_ERROR";
pub const DETECTION_ERROR: &str = "DETECTION_ERROR";
pub const DETECTOR_TIMEOUT: &str = "DETECTOR_TIMEOUT";
pub const POOL_ERROR: &str = "POOL_ERROR";
pub const CACHE_ERROR: &str = "CACHE_ERROR";
pub const CANCELLED: &str = "CANCELLED";
