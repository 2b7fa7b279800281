//! Top-level Insight configuration with layered resolution.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{CacheConfig, EngineConfig, ExecutionMode, FilterConfig, PoolConfig};
use crate::constants;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Programmatic overrides (`ConfigOverrides`)
/// 2. Environment variables (`INSIGHT_*`)
/// 3. Project config (`insight.toml` in the workspace root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InsightConfig {
    pub filter: FilterConfig,
    pub engine: EngineConfig,
    pub pool: PoolConfig,
    pub cache: CacheConfig,
    /// Per-detector settings tables, handed to the detector as its config.
    pub detectors: BTreeMap<String, toml::Value>,
}

/// Override arguments applied on top of every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_workers: Option<usize>,
    pub task_timeout_ms: Option<u64>,
    pub force_full: Option<bool>,
    pub execution: Option<ExecutionMode>,
    pub max_files: Option<usize>,
}

impl InsightConfig {
    /// Load configuration for the workspace at `root`.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(constants::PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(overrides) = overrides {
            Self::apply_overrides(&mut config, overrides);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing and embedding).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &InsightConfig) -> Result<(), ConfigError> {
        if config.pool.max_workers == Some(0) {
            return Err(invalid("pool.max_workers", "must be at least 1"));
        }
        if config.pool.task_timeout_ms == Some(0) {
            return Err(invalid("pool.task_timeout_ms", "must be greater than 0"));
        }
        if config.filter.cache_capacity == Some(0) {
            return Err(invalid("filter.cache_capacity", "must be at least 1"));
        }
        if config.filter.max_files == Some(0) {
            return Err(invalid("filter.max_files", "must be at least 1 when set"));
        }
        if config.filter.batch_size == Some(0) {
            return Err(invalid("filter.batch_size", "must be at least 1"));
        }
        if config.filter.max_file_size == Some(0) {
            return Err(invalid("filter.max_file_size", "must be greater than 0"));
        }
        if config.engine.parallel_threshold == Some(0) {
            return Err(invalid("engine.parallel_threshold", "must be at least 1"));
        }
        Ok(())
    }

    /// Settings table for one detector, if configured.
    pub fn detector_settings(&self, name: &str) -> Option<&toml::Value> {
        self.detectors.get(name)
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut InsightConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: InsightConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it sets a value.
    fn merge(base: &mut InsightConfig, other: InsightConfig) {
        // Filter
        let f = other.filter;
        if !f.custom_patterns.is_empty() {
            base.filter.custom_patterns = f.custom_patterns;
        }
        if !f.include_patterns.is_empty() {
            base.filter.include_patterns = f.include_patterns;
        }
        if f.ignore_files.is_some() {
            base.filter.ignore_files = f.ignore_files;
        }
        if f.builtin_exclusions.is_some() {
            base.filter.builtin_exclusions = f.builtin_exclusions;
        }
        if f.case_sensitive.is_some() {
            base.filter.case_sensitive = f.case_sensitive;
        }
        if f.default_action.is_some() {
            base.filter.default_action = f.default_action;
        }
        if !f.allowed_extensions.is_empty() {
            base.filter.allowed_extensions = f.allowed_extensions;
        }
        if !f.excluded_extensions.is_empty() {
            base.filter.excluded_extensions = f.excluded_extensions;
        }
        if f.max_file_size.is_some() {
            base.filter.max_file_size = f.max_file_size;
        }
        if f.max_files.is_some() {
            base.filter.max_files = f.max_files;
        }
        if f.cache_capacity.is_some() {
            base.filter.cache_capacity = f.cache_capacity;
        }
        if f.batch_size.is_some() {
            base.filter.batch_size = f.batch_size;
        }

        // Engine
        let e = other.engine;
        if e.force_full.is_some() {
            base.engine.force_full = e.force_full;
        }
        if e.incremental.is_some() {
            base.engine.incremental = e.incremental;
        }
        if e.execution.is_some() {
            base.engine.execution = e.execution;
        }
        if e.parallel_threshold.is_some() {
            base.engine.parallel_threshold = e.parallel_threshold;
        }
        if e.prioritize_by_risk.is_some() {
            base.engine.prioritize_by_risk = e.prioritize_by_risk;
        }
        if !e.enabled_detectors.is_empty() {
            base.engine.enabled_detectors = e.enabled_detectors;
        }
        if e.audit_log_path.is_some() {
            base.engine.audit_log_path = e.audit_log_path;
        }
        if e.debug.is_some() {
            base.engine.debug = e.debug;
        }

        // Pool
        if other.pool.max_workers.is_some() {
            base.pool.max_workers = other.pool.max_workers;
        }
        if other.pool.task_timeout_ms.is_some() {
            base.pool.task_timeout_ms = other.pool.task_timeout_ms;
        }
        if other.pool.verbose.is_some() {
            base.pool.verbose = other.pool.verbose;
        }

        // Cache
        if other.cache.path.is_some() {
            base.cache.path = other.cache.path;
        }

        // Detectors: per-name replacement
        base.detectors.extend(other.detectors);
    }

    /// Apply environment variable overrides.
    /// Unparseable values are ignored with a warning.
    fn apply_env_overrides(config: &mut InsightConfig) {
        if let Some(v) = env_parse::<usize>("INSIGHT_POOL_MAX_WORKERS") {
            config.pool.max_workers = Some(v);
        }
        if let Some(v) = env_parse::<u64>("INSIGHT_POOL_TASK_TIMEOUT_MS") {
            config.pool.task_timeout_ms = Some(v);
        }
        if let Some(v) = env_parse::<usize>("INSIGHT_FILTER_MAX_FILES") {
            config.filter.max_files = Some(v);
        }
        if let Some(v) = env_parse::<bool>("INSIGHT_ENGINE_FORCE_FULL") {
            config.engine.force_full = Some(v);
        }
    }

    fn apply_overrides(config: &mut InsightConfig, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.max_workers {
            config.pool.max_workers = Some(v);
        }
        if let Some(v) = overrides.task_timeout_ms {
            config.pool.task_timeout_ms = Some(v);
        }
        if let Some(v) = overrides.force_full {
            config.engine.force_full = Some(v);
        }
        if let Some(v) = overrides.execution {
            config.engine.execution = Some(v);
        }
        if let Some(v) = overrides.max_files {
            config.filter.max_files = Some(v);
        }
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
