//! The file filter: hard filters, then compiled rules, then the default.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use insight_core::config::{FilterAction, FilterConfig};
use insight_core::errors::FilterError;
use insight_core::traits::{Cancellable, CancellationToken};
use insight_core::types::collections::FxHashSet;

use super::builtin;
use super::check_cache::CheckCache;
use super::ignore_file;
use super::path;
use super::rules::{
    FilterRule, RuleMode, RuleSet, RuleSource, BUILTIN_PRIORITY, CUSTOM_PRIORITY,
    IGNORE_FILE_PRIORITY,
};
use super::stats::{FilterCounters, FilterStats};

/// Why a path was included or excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterReason {
    ExtensionNotAllowed { extension: Option<String> },
    ExtensionExcluded { extension: String },
    TooLarge { size: u64, limit: u64 },
    Rule { pattern: String, source: RuleSource, negated: bool },
    Default { action: FilterAction },
}

impl FilterReason {
    /// Short human-readable description.
    pub fn detail(&self) -> String {
        match self {
            Self::ExtensionNotAllowed { extension: Some(ext) } => {
                format!("extension .{ext} not in allow list")
            }
            Self::ExtensionNotAllowed { extension: None } => "no extension".to_string(),
            Self::ExtensionExcluded { extension } => format!("extension .{extension} excluded"),
            Self::TooLarge { size, limit } => format!("{size} bytes exceeds {limit}"),
            Self::Rule { pattern, source, .. } => format!("{pattern} ({source})"),
            Self::Default { action } => format!("default {action:?}").to_lowercase(),
        }
    }
}

/// Decision for one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterDecision {
    pub included: bool,
    pub reason: FilterReason,
}

/// Result of filtering a list with full reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOutcome {
    /// Normalized paths that passed, in input order.
    pub included: Vec<String>,
    pub excluded: Vec<(String, FilterReason)>,
    /// Paths that passed but were cut by the max-files policy.
    pub truncated: Vec<String>,
}

/// Inclusion/exclusion engine over a file set.
///
/// Construction compiles every rule; an invalid pattern or unreadable ignore
/// file fails here. Checks never fail afterwards.
#[derive(Debug)]
pub struct FileFilter {
    root: PathBuf,
    rules: RuleSet,
    case_sensitive: bool,
    default_action: FilterAction,
    allowed_extensions: FxHashSet<String>,
    excluded_extensions: FxHashSet<String>,
    max_file_size: u64,
    max_files: Option<usize>,
    batch_size: usize,
    cache: Mutex<CheckCache<FilterDecision>>,
    counters: FilterCounters,
}

impl FileFilter {
    pub fn new(root: impl Into<PathBuf>, config: &FilterConfig) -> Result<Self, FilterError> {
        let root = root.into();
        let case_sensitive = config.effective_case_sensitive();
        let rules = RuleSet::build(collect_rules(&root, config)?, case_sensitive)?;
        debug!(root = %root.display(), rules = rules.len(), "file filter compiled");

        let normalize_ext = |exts: &[String]| -> FxHashSet<String> {
            exts.iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect()
        };

        Ok(Self {
            rules,
            case_sensitive,
            default_action: config.effective_default_action(),
            allowed_extensions: normalize_ext(&config.allowed_extensions),
            excluded_extensions: normalize_ext(&config.excluded_extensions),
            max_file_size: config.effective_max_file_size(),
            max_files: config.max_files,
            batch_size: config.effective_batch_size().max(1),
            cache: Mutex::new(CheckCache::new(config.effective_cache_capacity())),
            counters: FilterCounters::default(),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalized display form of `path` (relative, `/`-separated, case kept).
    pub fn normalize(&self, path: &Path) -> String {
        path::normalize(&self.root, path)
    }

    pub fn should_include(&self, path: impl AsRef<Path>) -> bool {
        self.explain(path).included
    }

    /// Decision plus the reason behind it.
    pub fn explain(&self, path: impl AsRef<Path>) -> FilterDecision {
        let start = Instant::now();
        let display = self.normalize(path.as_ref());
        let key = path::match_key(&display, self.case_sensitive).into_owned();

        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key);
        if let Some(decision) = cached {
            self.counters
                .record(decision.included, true, start.elapsed());
            return decision;
        }

        let decision = self.evaluate(&display, &key);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, decision.clone());
        self.counters
            .record(decision.included, false, start.elapsed());
        decision
    }

    /// Paths that pass, normalized, in input order. The max-files policy applies.
    pub fn filter<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<String> {
        self.filter_with_report(paths).included
    }

    pub fn filter_with_report<P: AsRef<Path>>(&self, paths: &[P]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for p in paths {
            self.route(p.as_ref(), &mut outcome);
        }
        self.truncate(&mut outcome);
        outcome
    }

    /// Like [`filter`](Self::filter), processing `batch_size` paths at a time
    /// and yielding the thread between batches. Stops early, returning what
    /// was accepted so far, when `cancel` is triggered.
    pub fn filter_batched<P: AsRef<Path>>(
        &self,
        paths: &[P],
        batch_size: Option<usize>,
        cancel: Option<&CancellationToken>,
    ) -> Vec<String> {
        let batch_size = batch_size.unwrap_or(self.batch_size).max(1);
        let mut outcome = FilterOutcome::default();
        for (i, batch) in paths.chunks(batch_size).enumerate() {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                debug!(batches_done = i, "batched filter cancelled");
                break;
            }
            for p in batch {
                self.route(p.as_ref(), &mut outcome);
            }
            thread::yield_now();
        }
        self.truncate(&mut outcome);
        outcome.included
    }

    pub fn stats(&self) -> FilterStats {
        self.counters.snapshot()
    }

    /// Drop memoized decisions. Rules are unaffected.
    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn route(&self, path: &Path, outcome: &mut FilterOutcome) {
        let display = self.normalize(path);
        let decision = self.explain(path);
        if decision.included {
            outcome.included.push(display);
        } else {
            outcome.excluded.push((display, decision.reason));
        }
    }

    fn truncate(&self, outcome: &mut FilterOutcome) {
        let Some(max) = self.max_files else { return };
        if outcome.included.len() <= max {
            return;
        }
        outcome.truncated = outcome.included.split_off(max);
        self.counters.record_truncated(outcome.truncated.len());
        warn!(
            kept = max,
            dropped = outcome.truncated.len(),
            "file list truncated by max_files"
        );
    }

    fn evaluate(&self, display: &str, key: &str) -> FilterDecision {
        let extension = path::extension(key);

        if !self.allowed_extensions.is_empty()
            && !extension
                .as_ref()
                .is_some_and(|e| self.allowed_extensions.contains(e))
        {
            return excluded(FilterReason::ExtensionNotAllowed { extension });
        }
        if let Some(ext) = extension.as_ref() {
            if self.excluded_extensions.contains(ext) {
                return excluded(FilterReason::ExtensionExcluded {
                    extension: ext.clone(),
                });
            }
        }

        // Size is only enforced when the file can be stat'ed.
        let on_disk = if Path::new(display).is_absolute() {
            PathBuf::from(display)
        } else {
            self.root.join(display)
        };
        if let Ok(meta) = fs::metadata(&on_disk) {
            if meta.is_file() && meta.len() > self.max_file_size {
                return excluded(FilterReason::TooLarge {
                    size: meta.len(),
                    limit: self.max_file_size,
                });
            }
        }

        match self.rules.first_match(key) {
            Some(rule) => FilterDecision {
                included: rule.includes(),
                reason: FilterReason::Rule {
                    pattern: rule.pattern.clone(),
                    source: rule.source.clone(),
                    negated: rule.negated,
                },
            },
            None => FilterDecision {
                included: self.default_action == FilterAction::Include,
                reason: FilterReason::Default {
                    action: self.default_action,
                },
            },
        }
    }
}

fn excluded(reason: FilterReason) -> FilterDecision {
    FilterDecision {
        included: false,
        reason,
    }
}

/// Gather rules in initialization order: built-ins, ignore files, custom.
fn collect_rules(root: &Path, config: &FilterConfig) -> Result<Vec<FilterRule>, FilterError> {
    let mut rules = Vec::new();

    if config.effective_builtin_exclusions() {
        rules.extend(builtin::builtin_patterns().filter_map(|p| {
            FilterRule::parse(p, RuleMode::Blacklist, RuleSource::Builtin, BUILTIN_PRIORITY)
        }));
    }

    let max_seq = BUILTIN_PRIORITY - IGNORE_FILE_PRIORITY - 1;
    let mut seq: u32 = 0;
    for name in config.effective_ignore_files() {
        let Some(lines) = ignore_file::load(&root.join(&name))? else {
            continue;
        };
        let before = rules.len();
        for line in lines {
            let priority = IGNORE_FILE_PRIORITY + seq.min(max_seq);
            let source = RuleSource::IgnoreFile(name.clone());
            if let Some(rule) = FilterRule::parse(&line, RuleMode::Blacklist, source, priority) {
                rules.push(rule);
                seq = seq.saturating_add(1);
            }
        }
        debug!(file = %name, patterns = rules.len() - before, "loaded ignore file");
    }

    let custom = config
        .custom_patterns
        .iter()
        .map(|p| (p, RuleMode::Blacklist))
        .chain(config.include_patterns.iter().map(|p| (p, RuleMode::Whitelist)));
    for (i, (pattern, mode)) in custom.enumerate() {
        let priority = CUSTOM_PRIORITY.saturating_add(u32::try_from(i).unwrap_or(u32::MAX));
        rules.extend(FilterRule::parse(pattern, mode, RuleSource::Custom, priority));
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(config: FilterConfig) -> FileFilter {
        FileFilter::new("/nonexistent-root", &config).unwrap()
    }

    #[test]
    fn builtins_exclude_vcs_and_build_output() {
        let f = filter_with(FilterConfig::default());
        assert!(f.should_include("src/a.ts"));
        assert!(!f.should_include("dist/a.js"));
        assert!(!f.should_include(".git/HEAD"));
        assert!(!f.should_include("web/node_modules/react/index.js"));
    }

    #[test]
    fn env_file_is_not_a_builtin_exclusion() {
        let f = filter_with(FilterConfig::default());
        assert!(f.should_include(".env"));
    }

    #[test]
    fn extension_allow_list_is_a_hard_filter() {
        let f = filter_with(FilterConfig {
            allowed_extensions: vec![".ts".into()],
            include_patterns: vec!["*.py".into()],
            ..Default::default()
        });
        assert!(f.should_include("a.ts"));
        let d = f.explain("a.py");
        assert!(!d.included);
        assert!(matches!(d.reason, FilterReason::ExtensionNotAllowed { .. }));
    }

    #[test]
    fn default_action_applies_when_nothing_matches() {
        let f = filter_with(FilterConfig {
            default_action: Some(FilterAction::Exclude),
            include_patterns: vec!["src/".into()],
            ..Default::default()
        });
        assert!(f.should_include("src/lib.rs"));
        assert!(!f.should_include("scripts/run.sh"));
    }

    #[test]
    fn case_insensitive_by_default() {
        let f = filter_with(FilterConfig {
            custom_patterns: vec!["Secret/".into()],
            ..Default::default()
        });
        assert!(!f.should_include("SECRET/a.txt"));

        let f = filter_with(FilterConfig {
            custom_patterns: vec!["Secret/".into()],
            case_sensitive: Some(true),
            ..Default::default()
        });
        assert!(f.should_include("SECRET/a.txt"));
    }

    #[test]
    fn invalid_custom_pattern_fails_construction() {
        let result = FileFilter::new(
            "/nonexistent-root",
            &FilterConfig {
                custom_patterns: vec!["a[".into()],
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(FilterError::InvalidPattern { .. })));
    }
}
