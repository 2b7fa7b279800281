//! Shared constants for the Insight detector engine.

/// Insight version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project config file name, looked up in the workspace root.
pub const PROJECT_CONFIG_FILE: &str = "insight.toml";

/// Default change-detection cache file, relative to the workspace root.
pub const DEFAULT_CACHE_FILE: &str = ".insight/cache.json";

/// Repository ignore files merged into the filter, in load order.
pub const DEFAULT_IGNORE_FILES: &[&str] = &[".gitignore", ".insightignore"];

// ---- Filter ----

/// Capacity of the path-check cache before FIFO eviction kicks in.
pub const DEFAULT_FILTER_CACHE_CAPACITY: usize = 10_000;

/// Batch size for the cooperative batched filter.
pub const DEFAULT_FILTER_BATCH_SIZE: usize = 500;

/// Maximum file size in bytes accepted by the filter (default: 1MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

// ---- Worker pool ----

/// Fallback worker count when the CPU count cannot be determined.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default per-task timeout in milliseconds.
pub const DEFAULT_TASK_TIMEOUT_MS: u64 = 30_000;

/// Upper bound on how long the supervisor blocks before re-checking
/// deadlines and shutdown requests.
pub const SUPERVISOR_POLL_INTERVAL_MS: u64 = 50;

// ---- Engine ----

/// Below this many detector tasks the engine prefers the sequential executor.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

/// Version tag written into the change-detection cache file.
pub const CACHE_FORMAT_VERSION: u32 = 1;
