//! Issue and severity types.

use serde::{Deserialize, Serialize};

define_level!(
    /// Issue severity. Ordered so that `Critical` is the maximum.
    Severity
);

impl Severity {
    /// All severities, most severe first.
    pub fn all() -> &'static [Severity] {
        &[Self::Critical, Self::High, Self::Medium, Self::Low]
    }

    /// Parse a severity name, accepting a few common aliases from external tools.
    pub fn parse(raw: &str) -> Option<Severity> {
        match raw.to_ascii_lowercase().as_str() {
            "critical" | "blocker" | "fatal" => Some(Self::Critical),
            "high" | "error" | "major" => Some(Self::High),
            "medium" | "warning" | "warn" | "moderate" => Some(Self::Medium),
            "low" | "info" | "note" | "minor" | "hint" => Some(Self::Low),
            _ => None,
        }
    }
}

/// A single finding.
///
/// `file` and `detector` are stamped by the executor after the detector
/// returns, so every issue traces to exactly one detector and one target
/// regardless of what the detector filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub file: String,
    /// 0 when the finding is file-level.
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub detector: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Issue {
    pub fn new(line: u32, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            file: String::new(),
            line,
            column: None,
            severity,
            message: message.into(),
            detector: String::new(),
            category: String::new(),
            confidence: None,
        }
    }

    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Confidence is clamped to `0.0..=1.0`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_critical_highest() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn severity_aliases() {
        assert_eq!(Severity::parse("ERROR"), Some(Severity::High));
        assert_eq!(Severity::parse("warning"), Some(Severity::Medium));
        assert_eq!(Severity::parse("bogus"), None);
    }

    #[test]
    fn confidence_is_clamped() {
        let issue = Issue::new(1, Severity::Low, "x").with_confidence(1.7);
        assert_eq!(issue.confidence, Some(1.0));
    }
}
