//! Issue aggregation: deduplication and deterministic ordering.

use std::cmp::Ordering;

use insight_core::types::collections::BTreeMap;

use crate::detectors::Issue;
use crate::executor::DetectorResult;

type DedupKey = (String, u32, String, String);

fn dedup_key(issue: &Issue) -> DedupKey {
    (
        issue.file.clone(),
        issue.line,
        issue.category.clone(),
        issue.message.clone(),
    )
}

/// `None` sorts below every confidence value.
fn cmp_confidence(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Which duplicate survives: highest confidence, then higher severity, then
/// smallest detector name, then smallest column. `Greater` means `a` wins.
fn preference(a: &Issue, b: &Issue) -> Ordering {
    cmp_confidence(a.confidence, b.confidence)
        .then_with(|| a.severity.cmp(&b.severity))
        .then_with(|| b.detector.cmp(&a.detector))
        .then_with(|| b.column.cmp(&a.column))
}

/// Final report order: severity desc, confidence desc, then location.
pub fn report_order(a: &Issue, b: &Issue) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| cmp_confidence(b.confidence, a.confidence))
        .then_with(|| a.file.cmp(&b.file))
        .then_with(|| a.line.cmp(&b.line))
        .then_with(|| a.column.cmp(&b.column))
        .then_with(|| a.detector.cmp(&b.detector))
        .then_with(|| a.message.cmp(&b.message))
}

/// Deduplicate on (file, line, category, message) and sort. The output is
/// independent of the order of `issues`.
pub fn dedupe_and_sort(issues: impl IntoIterator<Item = Issue>) -> Vec<Issue> {
    let mut best: BTreeMap<DedupKey, Issue> = BTreeMap::new();
    for issue in issues {
        let key = dedup_key(&issue);
        match best.get_mut(&key) {
            Some(current) => {
                if preference(&issue, current) == Ordering::Greater {
                    *current = issue;
                }
            }
            None => {
                best.insert(key, issue);
            }
        }
    }
    let mut out: Vec<Issue> = best.into_values().collect();
    out.sort_by(report_order);
    out
}

/// Combine fresh detector results with issues carried over from the cache.
pub fn aggregate(results: &[DetectorResult], carried: Vec<Issue>) -> Vec<Issue> {
    let fresh = results.iter().flat_map(|r| r.issues.iter().cloned());
    dedupe_and_sort(carried.into_iter().chain(fresh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::Severity;

    fn issue(detector: &str, line: u32, severity: Severity, confidence: Option<f64>) -> Issue {
        let mut i = Issue::new(line, severity, "hard-coded secret").with_category("security");
        i.file = "a.ts".into();
        i.detector = detector.into();
        i.confidence = confidence;
        i
    }

    #[test]
    fn duplicates_keep_highest_confidence() {
        let a = issue("z-scan", 3, Severity::High, Some(0.4));
        let b = issue("a-scan", 3, Severity::High, Some(0.9));
        let out = dedupe_and_sort(vec![a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].detector, "a-scan");
    }

    #[test]
    fn tie_break_is_order_independent() {
        let a = issue("beta", 3, Severity::High, None);
        let b = issue("alpha", 3, Severity::High, None);
        let first = dedupe_and_sort(vec![a.clone(), b.clone()]);
        let second = dedupe_and_sort(vec![b, a]);
        assert_eq!(first, second);
        assert_eq!(first[0].detector, "alpha");
    }

    #[test]
    fn sorted_by_severity_then_confidence() {
        let low = issue("d", 1, Severity::Low, Some(1.0));
        let mut high_unsure = issue("d", 2, Severity::High, None);
        high_unsure.message = "other".into();
        let high_sure = issue("d", 3, Severity::High, Some(0.5));
        let out = dedupe_and_sort(vec![low, high_unsure, high_sure]);
        let lines: Vec<u32> = out.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![3, 2, 1]);
    }
}
