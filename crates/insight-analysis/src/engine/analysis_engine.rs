//! The analysis engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use insight_core::config::{ExecutionMode, InsightConfig};
use insight_core::errors::{ConfigError, InsightErrorCode, PipelineError, PoolError};
use insight_core::events::types::{
    AnalysisCompleteEvent, AnalysisStartedEvent, ErrorEvent, FileRoutedEvent,
};
use insight_core::events::{EventDispatcher, InsightEventHandler};
use insight_core::tracing::metrics;
use insight_core::types::collections::FxHashMap;

use super::aggregate;
use super::audit::AuditLog;
use super::summary::{RunSummary, SkipReason};
use crate::change::{entry_now, ChangeDetector, ChangeStats, FileDigest};
use crate::classify::{
    is_routable_detector, Classification, FileType, FileTypeClassifier, RiskTier,
};
use crate::detectors::{DetectorRegistry, DetectorTarget, Issue};
use crate::executor::{
    DetectorResult, DetectorTask, Executor, ParallelExecutor, SequentialExecutor, TaskPlanner,
};
use crate::filter::{FileFilter, FilterStats};
use crate::pool::{PoolStats, WorkerPoolConfig};

/// Per-call options. Unset fields fall back to the engine configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub force_full: Option<bool>,
    pub execution: Option<ExecutionMode>,
    /// Restrict the run to these detectors.
    pub detectors: Option<Vec<String>>,
}

/// One file that survived filtering and classification.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub path: String,
    /// Empty when incremental analysis is off or the file is unreadable.
    pub hash: FileDigest,
    pub cached_hash: Option<FileDigest>,
    pub file_type: FileType,
    pub risk: RiskTier,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub issues: Vec<Issue>,
    pub detector_results: Vec<DetectorResult>,
    pub files: Vec<FileRecord>,
    pub summary: RunSummary,
    pub filter_stats: FilterStats,
    pub change_stats: ChangeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_stats: Option<PoolStats>,
}

/// Orchestrates one workspace's analysis runs.
///
/// Owns every piece of per-run state: the filter, the change cache, the
/// lazily started worker pool, and the audit log. Nothing is global.
pub struct AnalysisEngine {
    root: PathBuf,
    config: InsightConfig,
    registry: DetectorRegistry,
    filter: FileFilter,
    classifier: FileTypeClassifier,
    change: ChangeDetector,
    pool_config: WorkerPoolConfig,
    parallel: Option<ParallelExecutor>,
    events: EventDispatcher,
    audit: AuditLog,
}

impl AnalysisEngine {
    /// Validate configuration and compile the filter. Configuration mistakes
    /// are the only errors that escape the engine.
    pub fn new(
        root: impl Into<PathBuf>,
        config: InsightConfig,
        registry: DetectorRegistry,
    ) -> Result<Self, PipelineError> {
        let root = root.into();
        InsightConfig::validate(&config)?;
        check_detectors(&registry, &config.engine.enabled_detectors)?;

        let pool_config = WorkerPoolConfig::from_config(&config.pool)
            .with_priority_dispatch(config.engine.effective_prioritize_by_risk());
        pool_config.validate()?;

        let filter = FileFilter::new(&root, &config.filter)?;
        let change = ChangeDetector::new(&root, config.cache.effective_path(&root));
        let audit = AuditLog::new(
            config
                .engine
                .audit_log_path
                .as_deref()
                .map(|p| resolve(&root, p)),
        );

        Ok(Self {
            root,
            config,
            registry,
            filter,
            classifier: FileTypeClassifier::new(),
            change,
            pool_config,
            parallel: None,
            events: EventDispatcher::new(),
            audit,
        })
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn InsightEventHandler>) -> Self {
        self.events.register(handler);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Stop the worker pool, if one was started. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(mut parallel) = self.parallel.take() {
            parallel.shutdown();
        }
    }

    /// Run the full pipeline over `files`.
    ///
    /// Detector failures, timeouts, cache write errors and audit write errors
    /// end up in the result; only an unknown requested detector is an `Err`.
    pub fn analyze(
        &mut self,
        files: &[PathBuf],
        options: &AnalyzeOptions,
    ) -> Result<AnalysisResult, PipelineError> {
        let start = Instant::now();
        let engine_cfg = &self.config.engine;
        let incremental = engine_cfg.effective_incremental();
        let force_full = options
            .force_full
            .unwrap_or_else(|| engine_cfg.effective_force_full());
        let mode = options
            .execution
            .unwrap_or_else(|| engine_cfg.effective_execution());
        let requested: Option<Vec<String>> = match &options.detectors {
            Some(list) => Some(list.clone()),
            None if !engine_cfg.enabled_detectors.is_empty() => {
                Some(engine_cfg.enabled_detectors.clone())
            }
            None => None,
        };
        if let Some(list) = &requested {
            check_detectors(&self.registry, list)?;
        }
        let prioritize = engine_cfg.effective_prioritize_by_risk();
        let debug_run = engine_cfg.effective_debug();
        let threshold = engine_cfg.effective_parallel_threshold();

        info!(root = %self.root.display(), files = files.len(), force_full, "analysis started");
        self.events.emit_analysis_started(&AnalysisStartedEvent {
            root: self.root.clone(),
            file_count: files.len(),
            force_full,
        });

        let audit_start = self.audit.len();
        let mut summary = RunSummary::new(files.len(), force_full);

        // Filter. Decisions are not reused across runs.
        self.filter.clear_cache();
        let outcome = self.filter.filter_with_report(files);
        for (path, reason) in outcome.excluded {
            self.skip(&mut summary, path, SkipReason::Excluded { detail: reason.detail() }, None);
        }
        for path in outcome.truncated {
            self.skip(&mut summary, path, SkipReason::Truncated, None);
        }

        // Classify.
        let batch = self
            .classifier
            .classify_batch(&outcome.included, requested.as_deref(), prioritize);
        for (path, file_type) in batch.dropped {
            self.skip(&mut summary, path, SkipReason::NonAnalyzable { file_type }, None);
        }
        let mut candidates: Vec<(String, Classification)> = Vec::with_capacity(batch.analyzable.len());
        for (path, mut classification) in batch.analyzable {
            classification
                .allowed_detectors
                .retain(|d| self.registry.contains(d));
            if classification.allowed_detectors.is_empty() {
                self.skip(&mut summary, path, SkipReason::NoApplicableDetectors, Some(&classification));
            } else {
                candidates.push((path, classification));
            }
        }

        // Change detection.
        let digests: Vec<FileDigest> = if incremental {
            self.change.load();
            self.change.reset_stats();
            let paths: Vec<String> = candidates.iter().map(|(p, _)| p.clone()).collect();
            self.change.hash_many(&paths)
        } else {
            vec![FileDigest::empty(); candidates.len()]
        };

        let mut records = Vec::with_capacity(candidates.len());
        let mut carried: Vec<Issue> = Vec::new();
        let mut targets: Vec<Arc<DetectorTarget>> = Vec::new();
        let mut target_digests: FxHashMap<String, FileDigest> = FxHashMap::default();
        for ((path, classification), digest) in candidates.into_iter().zip(digests) {
            let cached_hash = self.change.cached(&path).map(|e| e.hash.clone());
            records.push(FileRecord {
                path: path.clone(),
                hash: digest.clone(),
                cached_hash,
                file_type: classification.file_type,
                risk: classification.risk,
            });

            if incremental {
                let status = self
                    .change
                    .status(&path, &digest, &classification.allowed_detectors);
                if !force_full && !status.is_changed() {
                    if let Some(entry) = self.change.cached(&path) {
                        carried.extend(entry.issues.iter().cloned());
                    }
                    self.skip(&mut summary, path, SkipReason::Unchanged, Some(&classification));
                    continue;
                }
            }

            self.audit.record_analyze(&path, &classification);
            self.events.emit_file_routed(&FileRoutedEvent {
                path: path.clone(),
                analyzed: true,
                reason: None,
            });
            debug!(path = %path, file_type = %classification.file_type, risk = %classification.risk, "routed to detectors");
            target_digests.insert(path.clone(), digest);
            targets.push(Arc::new(DetectorTarget {
                absolute: resolve(&self.root, &path),
                path,
                file_type: classification.file_type,
                risk: classification.risk,
                language: classification.language,
                allowed_detectors: classification.allowed_detectors,
            }));
        }
        summary.files_analyzed = targets.len();

        // Plan and execute.
        let detectors: Vec<_> = self.registry.iter().cloned().collect();
        let tasks = TaskPlanner::new(self.pool_config.task_timeout)
            .with_settings(self.config.detectors.iter())
            .plan(&detectors, &targets);

        let use_parallel = match mode {
            ExecutionMode::Sequential => false,
            ExecutionMode::Parallel => true,
            ExecutionMode::Auto => !debug_run && tasks.len() >= threshold,
        };
        let results = if use_parallel && !tasks.is_empty() {
            match self.parallel_executor() {
                Ok(executor) => {
                    summary.executor = executor.name().to_string();
                    executor.execute(tasks)
                }
                Err(e) => {
                    let message = format!("worker pool unavailable, running sequentially: {e}");
                    warn!(error = %e, "worker pool unavailable, running sequentially");
                    self.report_error(&message, e.error_code());
                    summary.warnings.push(message);
                    self.run_sequential(&mut summary, tasks)
                }
            }
        } else {
            self.run_sequential(&mut summary, tasks)
        };
        summary.record_results(&results);

        // Refresh cache entries for files whose results are all clean.
        if incremental {
            let mut by_file: FxHashMap<&str, Vec<&DetectorResult>> = FxHashMap::default();
            for r in &results {
                by_file.entry(r.file.as_str()).or_default().push(r);
            }
            let mut updates = Vec::new();
            let mut invalidated = Vec::new();
            for target in &targets {
                let file_results = by_file.remove(target.path.as_str()).unwrap_or_default();
                let digest = target_digests.remove(&target.path).unwrap_or_default();
                if !digest.is_empty() && file_results.iter().all(|r| r.is_clean()) {
                    let issues = file_results.iter().flat_map(|r| r.issues.iter().cloned()).collect();
                    updates.push(entry_now(target.path.clone(), digest, &target.allowed_detectors, issues));
                } else {
                    invalidated.push(target.path.clone());
                }
            }
            if let Err(e) = self.change.commit(updates, &invalidated) {
                let message = format!("change cache not written: {e}");
                warn!(error = %e, "change cache not written");
                self.report_error(&message, e.error_code());
                summary.warnings.push(message);
            }
        }

        let issues = aggregate::aggregate(&results, carried);
        summary.record_issues(&issues);

        if let Err(e) = self.audit.flush() {
            let message = format!("audit log not written: {e}");
            warn!(error = %e, "audit log not written");
            summary.warnings.push(message);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        let filter_stats = self.filter.stats();
        let pool_stats = self.parallel.as_ref().map(ParallelExecutor::stats);
        info!(
            files_analyzed = summary.files_analyzed,
            files_skipped = summary.files_skipped.len(),
            issues = issues.len(),
            crashed = summary.detectors_crashed,
            timed_out = summary.detectors_timed_out,
            executor = %summary.executor,
            { metrics::ANALYSIS_DURATION } = summary.duration_ms,
            { metrics::FILES_UNCHANGED } = summary.skipped("unchanged"),
            { metrics::FILTER_CACHE_HIT_RATE } = filter_stats.cache_hit_rate(),
            { metrics::FILTER_AVG_CHECK_US } = filter_stats.avg_check_us,
            { metrics::FILTER_CHECKS_PER_SECOND } = filter_stats.checks_per_second(),
            "analysis complete"
        );
        debug!(audit_records = self.audit.since(audit_start).len(), "audit records this run");
        self.events.emit_analysis_complete(&AnalysisCompleteEvent {
            files_analyzed: summary.files_analyzed,
            files_skipped: summary.files_skipped.len(),
            issue_count: issues.len(),
            duration_ms: summary.duration_ms,
        });

        Ok(AnalysisResult {
            issues,
            detector_results: results,
            files: records,
            summary,
            filter_stats,
            change_stats: self.change.stats().clone(),
            pool_stats,
        })
    }

    fn skip(
        &mut self,
        summary: &mut RunSummary,
        path: String,
        reason: SkipReason,
        classification: Option<&Classification>,
    ) {
        debug!(path = %path, reason = reason.key(), "file skipped");
        self.audit.record_skip(&path, reason.clone(), classification);
        self.events.emit_file_routed(&FileRoutedEvent {
            path: path.clone(),
            analyzed: false,
            reason: Some(reason.detail()),
        });
        summary.skip(path, reason);
    }

    fn run_sequential(
        &self,
        summary: &mut RunSummary,
        tasks: Vec<DetectorTask>,
    ) -> Vec<DetectorResult> {
        let mut executor = SequentialExecutor::new().with_events(self.events.clone());
        summary.executor = executor.name().to_string();
        executor.execute(tasks)
    }

    /// The worker pool, started on first use and restarted if it was shut down.
    fn parallel_executor(&mut self) -> Result<&mut ParallelExecutor, PoolError> {
        let executor = match self.parallel.take() {
            Some(p) if !p.shutdown_handle().is_shutdown() => p,
            _ => ParallelExecutor::with_events(self.pool_config.clone(), self.events.clone())?,
        };
        Ok(self.parallel.insert(executor))
    }

    fn report_error(&self, message: &str, code: &str) {
        self.events.emit_error(&ErrorEvent {
            message: message.to_string(),
            error_code: code.to_string(),
        });
    }
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("root", &self.root)
            .field("detectors", &self.registry.names())
            .field("pool_started", &self.parallel.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

fn check_detectors(registry: &DetectorRegistry, names: &[String]) -> Result<(), ConfigError> {
    if let Some(name) = registry.names().into_iter().find(|n| !is_routable_detector(n)) {
        return Err(ConfigError::UnroutableDetector {
            name: name.to_string(),
        });
    }
    let unknown: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| !registry.contains(n))
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed {
            field: "engine.enabled_detectors".to_string(),
            message: format!("unknown detectors: {}", unknown.join(", ")),
        })
    }
}
