//! Analysis engine configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Which executor runs the detector tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Sequential for small or debug runs, parallel otherwise.
    #[default]
    Auto,
    Sequential,
    Parallel,
}

/// Configuration for the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Skip change detection and analyze every file. Default: false.
    pub force_full: Option<bool>,
    /// Enable incremental analysis via the change-detection cache. Default: true.
    pub incremental: Option<bool>,
    /// Executor selection. Default: auto.
    pub execution: Option<ExecutionMode>,
    /// Task count below which `auto` picks the sequential executor. Default: 16.
    pub parallel_threshold: Option<usize>,
    /// Dispatch high-risk files first. Default: true.
    pub prioritize_by_risk: Option<bool>,
    /// Restrict the run to these detectors. Empty means all registered detectors.
    pub enabled_detectors: Vec<String>,
    /// Append routing decisions as JSON lines to this file.
    pub audit_log_path: Option<String>,
    /// Debug runs always use the sequential executor. Default: false.
    pub debug: Option<bool>,
}

impl EngineConfig {
    pub fn effective_force_full(&self) -> bool {
        self.force_full.unwrap_or(false)
    }

    pub fn effective_incremental(&self) -> bool {
        self.incremental.unwrap_or(true)
    }

    pub fn effective_execution(&self) -> ExecutionMode {
        self.execution.unwrap_or_default()
    }

    pub fn effective_parallel_threshold(&self) -> usize {
        self.parallel_threshold.unwrap_or(constants::DEFAULT_PARALLEL_THRESHOLD)
    }

    pub fn effective_prioritize_by_risk(&self) -> bool {
        self.prioritize_by_risk.unwrap_or(true)
    }

    pub fn effective_debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}
