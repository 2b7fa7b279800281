//! Per-run summary.

use serde::Serialize;

use insight_core::types::collections::BTreeMap;

use crate::classify::FileType;
use crate::detectors::{Issue, Severity};
use crate::executor::DetectorResult;

/// Why a file was not analyzed this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Rejected by the file filter.
    Excluded { detail: String },
    /// Cut by the max-files policy.
    Truncated,
    /// Generated or runtime output.
    NonAnalyzable { file_type: FileType },
    /// No registered, requested detector applies to the file type.
    NoApplicableDetectors,
    /// Content and detector set match the cache.
    Unchanged,
}

impl SkipReason {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Excluded { .. } => "excluded",
            Self::Truncated => "truncated",
            Self::NonAnalyzable { .. } => "non_analyzable",
            Self::NoApplicableDetectors => "no_applicable_detectors",
            Self::Unchanged => "unchanged",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Excluded { detail } => format!("excluded: {detail}"),
            Self::NonAnalyzable { file_type } => format!("non-analyzable file type {file_type}"),
            other => other.key().replace('_', " "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Always produced, even when detectors failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files_requested: usize,
    pub files_analyzed: usize,
    pub files_skipped: Vec<SkippedFile>,
    pub skipped_by_reason: BTreeMap<String, usize>,
    pub issues_by_severity: BTreeMap<String, usize>,
    pub total_issues: usize,
    pub tasks_run: usize,
    pub detectors_crashed: usize,
    pub detectors_timed_out: usize,
    pub detectors_cancelled: usize,
    pub truncated: usize,
    pub force_full: bool,
    pub executor: String,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn new(files_requested: usize, force_full: bool) -> Self {
        Self {
            files_requested,
            force_full,
            issues_by_severity: Severity::all()
                .iter()
                .map(|s| (s.name().to_string(), 0))
                .collect(),
            ..Default::default()
        }
    }

    pub fn skip(&mut self, path: impl Into<String>, reason: SkipReason) {
        *self
            .skipped_by_reason
            .entry(reason.key().to_string())
            .or_default() += 1;
        if reason == SkipReason::Truncated {
            self.truncated += 1;
        }
        self.files_skipped.push(SkippedFile {
            path: path.into(),
            reason,
        });
    }

    pub fn skipped(&self, reason_key: &str) -> usize {
        self.skipped_by_reason.get(reason_key).copied().unwrap_or(0)
    }

    pub fn record_results(&mut self, results: &[DetectorResult]) {
        self.tasks_run += results.len();
        for r in results {
            self.detectors_crashed += usize::from(r.crashed);
            self.detectors_timed_out += usize::from(r.timed_out);
            self.detectors_cancelled += usize::from(r.cancelled);
        }
    }

    pub fn record_issues(&mut self, issues: &[Issue]) {
        self.total_issues = issues.len();
        for issue in issues {
            *self
                .issues_by_severity
                .entry(issue.severity.name().to_string())
                .or_default() += 1;
        }
    }
}
