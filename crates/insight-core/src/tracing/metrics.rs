//! Structured span field definitions for Insight metrics.
//!
//! These constants define the field names used in tracing events across
//! subsystems so that log queries and dashboards stay stable.

/// Filter: paths checked per second.
pub const FILTER_CHECKS_PER_SECOND: &str = "filter_checks_per_second";

/// Filter: path-check cache hit rate (0.0 - 1.0).
pub const FILTER_CACHE_HIT_RATE: &str = "filter_cache_hit_rate";

/// Filter: average check latency in microseconds.
pub const FILTER_AVG_CHECK_US: &str = "filter_avg_check_us";

/// Change detection: hashing phase duration in milliseconds.
pub const HASHING_DURATION: &str = "hashing_duration";

/// Change detection: files skipped as unchanged.
pub const FILES_UNCHANGED: &str = "files_unchanged";

/// Pool: tasks dispatched to workers.
pub const POOL_TASKS_DISPATCHED: &str = "pool_tasks_dispatched";

/// Pool: tasks that hit their timeout.
pub const POOL_TASKS_TIMED_OUT: &str = "pool_tasks_timed_out";

/// Pool: tasks whose worker crashed.
pub const POOL_TASKS_CRASHED: &str = "pool_tasks_crashed";

/// Pool: workers replaced after a timeout or crash.
pub const POOL_WORKERS_REPLACED: &str = "pool_workers_replaced";

/// Detectors: detection time per detector in milliseconds.
pub const DETECTION_TIME_PER_DETECTOR: &str = "detection_time_per_detector";

/// Engine: total run duration in milliseconds.
pub const ANALYSIS_DURATION: &str = "analysis_duration";
