//! Filter rules and their compiled matchers.

use std::fmt;
use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::Serialize;

use insight_core::errors::FilterError;

/// Priority of repository ignore-file lines; each line adds its sequence number.
pub const IGNORE_FILE_PRIORITY: u32 = 1_000;
/// Priority of built-in exclusions. Above every ignore-file line.
pub const BUILTIN_PRIORITY: u32 = 500_000;
/// Priority of caller-supplied patterns; each pattern adds its index.
pub const CUSTOM_PRIORITY: u32 = 1_000_000;

/// Whether a (non-negated) match excludes or includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMode {
    Blacklist,
    Whitelist,
}

/// Where a rule came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "file", rename_all = "snake_case")]
pub enum RuleSource {
    Builtin,
    IgnoreFile(String),
    Custom,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("builtin"),
            Self::IgnoreFile(name) => write!(f, "{name}"),
            Self::Custom => f.write_str("custom"),
        }
    }
}

/// One filter rule, before compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterRule {
    /// The line as written, in ignore-file syntax.
    pub pattern: String,
    pub mode: RuleMode,
    pub source: RuleSource,
    pub negated: bool,
    pub priority: u32,
}

impl FilterRule {
    /// Parse a line in `.gitignore` syntax. Comments and blank lines yield
    /// `None`. A line whose glob is invalid is kept so compilation reports it.
    pub fn parse(raw: &str, mode: RuleMode, source: RuleSource, priority: u32) -> Option<Self> {
        let negated = match build_line(raw, true) {
            Ok(gi) if gi.num_ignores() + gi.num_whitelists() == 0 => return None,
            Ok(gi) => gi.num_whitelists() > 0,
            Err(_) => raw.starts_with('!'),
        };
        Some(Self {
            pattern: raw.to_string(),
            mode,
            source,
            negated,
            priority,
        })
    }

    /// `true` when a match means "include".
    pub fn includes(&self) -> bool {
        (self.mode == RuleMode::Whitelist) != self.negated
    }
}

/// One-line gitignore matcher. Paths handed to it are already root-relative.
fn build_line(line: &str, case_sensitive: bool) -> Result<Gitignore, ignore::Error> {
    let mut builder = GitignoreBuilder::new(".");
    builder.case_insensitive(!case_sensitive)?;
    builder.add_line(None, line)?;
    builder.build()
}

/// A rule with its pre-compiled matcher.
pub struct CompiledRule {
    pub rule: FilterRule,
    matcher: Gitignore,
}

impl CompiledRule {
    pub fn compile(rule: FilterRule, case_sensitive: bool) -> Result<Self, FilterError> {
        let matcher = build_line(&rule.pattern, case_sensitive).map_err(|e| {
            FilterError::InvalidPattern {
                pattern: rule.pattern.clone(),
                source_name: rule.source.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self { rule, matcher })
    }

    /// Whether the rule's pattern matches `path` or one of its parent
    /// directories. Negation does not affect the answer.
    pub fn matches(&self, path: &str) -> bool {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.as_os_str().is_empty() || relative.has_root() {
            return false;
        }
        !self
            .matcher
            .matched_path_or_any_parents(relative, false)
            .is_none()
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("rule", &self.rule)
            .finish_non_exhaustive()
    }
}

/// Compiled rules in evaluation order.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile and order rules: priority descending, negated first at equal
    /// priority, otherwise insertion order.
    pub fn build(rules: Vec<FilterRule>, case_sensitive: bool) -> Result<Self, FilterError> {
        let mut compiled = rules
            .into_iter()
            .map(|r| CompiledRule::compile(r, case_sensitive))
            .collect::<Result<Vec<_>, _>>()?;
        compiled.sort_by(|a, b| {
            b.rule
                .priority
                .cmp(&a.rule.priority)
                .then_with(|| b.rule.negated.cmp(&a.rule.negated))
        });
        Ok(Self { rules: compiled })
    }

    /// First matching rule, if any.
    pub fn first_match(&self, path: &str) -> Option<&FilterRule> {
        self.rules
            .iter()
            .find(|r| r.matches(path))
            .map(|r| &r.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(p: &str, priority: u32) -> FilterRule {
        FilterRule::parse(p, RuleMode::Blacklist, RuleSource::Custom, priority).unwrap()
    }

    #[test]
    fn parse_handles_negation_and_escapes() {
        let r = rule("!keep.txt", 1);
        assert!(r.negated);
        assert_eq!(r.pattern, "!keep.txt");
        assert!(r.includes());

        let r = rule("\\!bang", 1);
        assert!(!r.negated);
        let compiled = CompiledRule::compile(r, true).unwrap();
        assert!(compiled.matches("!bang"));

        let blank = |line: &str| FilterRule::parse(line, RuleMode::Blacklist, RuleSource::Custom, 1);
        assert!(blank("   ").is_none());
        assert!(blank("# comment").is_none());
        assert!(blank("\\#hash").is_some());
    }

    #[test]
    fn escaped_trailing_space_is_kept() {
        let r = CompiledRule::compile(rule("name\\ ", 1), true).unwrap();
        assert!(r.matches("name "));
        assert!(!r.matches("name"));

        let r = CompiledRule::compile(rule("plain   ", 1), true).unwrap();
        assert!(r.matches("plain"));
    }

    #[test]
    fn absolute_path_outside_root_is_matched_relative() {
        let r = CompiledRule::compile(rule("*.log", 1), true).unwrap();
        assert!(r.matches("/var/tmp/a.log"));
        assert!(!r.matches(""));
    }

    #[test]
    fn unanchored_pattern_matches_at_any_depth() {
        let r = CompiledRule::compile(rule("*.log", 1), false).unwrap();
        assert!(r.matches("a.log"));
        assert!(r.matches("deep/dir/b.log"));
        assert!(!r.matches("a.logs"));
    }

    #[test]
    fn dir_pattern_matches_contents_only() {
        let r = CompiledRule::compile(rule("build/", 1), false).unwrap();
        assert!(r.matches("build/out.js"));
        assert!(r.matches("pkg/build/x/y.js"));
        assert!(!r.matches("build"));
        assert!(!r.matches("builder/x.js"));
    }

    #[test]
    fn anchored_pattern_matches_from_root() {
        let r = CompiledRule::compile(rule("/docs/api", 1), false).unwrap();
        assert!(r.matches("docs/api"));
        assert!(r.matches("docs/api/index.md"));
        assert!(!r.matches("x/docs/api"));
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let r = CompiledRule::compile(rule("src/*.ts", 1), false).unwrap();
        assert!(r.matches("src/a.ts"));
        assert!(!r.matches("src/nested/a.ts"));
    }

    #[test]
    fn negated_rule_wins_at_equal_priority() {
        let set = RuleSet::build(vec![rule("*.ts", 5), rule("!a.ts", 5)], false).unwrap();
        assert!(set.first_match("a.ts").unwrap().negated);
        assert!(!set.first_match("b.ts").unwrap().negated);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let err = CompiledRule::compile(rule("src/[a", 1), false).unwrap_err();
        assert!(matches!(err, FilterError::InvalidPattern { .. }));
    }
}
