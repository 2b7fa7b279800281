//! File filter configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// What happens to a path that no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    #[default]
    Include,
    Exclude,
}

/// Configuration for the inclusion/exclusion filter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    /// Extra exclusion patterns (ignore-file syntax, `!` negates). Highest priority.
    pub custom_patterns: Vec<String>,
    /// Whitelist patterns: a match force-includes the path. Same tier as `custom_patterns`.
    pub include_patterns: Vec<String>,
    /// Ignore files to merge, relative to the root. Default: `.gitignore`, `.insightignore`.
    pub ignore_files: Option<Vec<String>>,
    /// Apply the built-in exclusions (VCS, dependencies, build output...). Default: true.
    pub builtin_exclusions: Option<bool>,
    /// Match paths case-sensitively. Default: false.
    pub case_sensitive: Option<bool>,
    /// Outcome for paths no rule matches. Default: include.
    pub default_action: Option<FilterAction>,
    /// If non-empty, only these extensions pass (without the leading dot).
    pub allowed_extensions: Vec<String>,
    /// Extensions that never pass.
    pub excluded_extensions: Vec<String>,
    /// Maximum file size in bytes. Default: 1MB.
    pub max_file_size: Option<u64>,
    /// Maximum number of files kept after filtering. Default: unlimited.
    pub max_files: Option<usize>,
    /// Path-check cache capacity. Default: 10,000.
    pub cache_capacity: Option<usize>,
    /// Batch size for the batched filter. Default: 500.
    pub batch_size: Option<usize>,
}

impl FilterConfig {
    pub fn effective_builtin_exclusions(&self) -> bool {
        self.builtin_exclusions.unwrap_or(true)
    }

    pub fn effective_case_sensitive(&self) -> bool {
        self.case_sensitive.unwrap_or(false)
    }

    pub fn effective_default_action(&self) -> FilterAction {
        self.default_action.unwrap_or_default()
    }

    pub fn effective_ignore_files(&self) -> Vec<String> {
        match &self.ignore_files {
            Some(files) => files.clone(),
            None => constants::DEFAULT_IGNORE_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(constants::DEFAULT_MAX_FILE_SIZE)
    }

    pub fn effective_cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(constants::DEFAULT_FILTER_CACHE_CAPACITY)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(constants::DEFAULT_FILTER_BATCH_SIZE)
    }
}
