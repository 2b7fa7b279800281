//! Inclusion/exclusion filtering over a file set.
//!
//! Rules come from three tiers: built-in exclusions, repository ignore files,
//! and caller-supplied patterns. They are compiled once into gitignore matchers and
//! evaluated highest-priority-first. Path checks are memoized in a bounded
//! FIFO cache.

pub mod builtin;
pub mod check_cache;
pub mod file_filter;
pub mod ignore_file;
pub mod path;
pub mod rules;
pub mod stats;

pub use file_filter::{FileFilter, FilterDecision, FilterOutcome, FilterReason};
pub use rules::{FilterRule, RuleMode, RuleSource};
pub use stats::FilterStats;
