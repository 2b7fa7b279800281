//! Filter statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Snapshot of filter counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterStats {
    pub total_checked: u64,
    pub included: u64,
    pub excluded: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Paths dropped by the max-files policy.
    pub truncated: u64,
    pub avg_check_us: f64,
}

impl FilterStats {
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }

    pub fn checks_per_second(&self) -> f64 {
        if self.avg_check_us <= 0.0 {
            0.0
        } else {
            1_000_000.0 / self.avg_check_us
        }
    }
}

/// Live counters, updated from `&self` check paths.
#[derive(Debug, Default)]
pub(crate) struct FilterCounters {
    checked: AtomicU64,
    included: AtomicU64,
    excluded: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    truncated: AtomicU64,
    check_nanos: AtomicU64,
}

impl FilterCounters {
    pub(crate) fn record(&self, included: bool, cache_hit: bool, elapsed: Duration) {
        self.checked.fetch_add(1, Ordering::Relaxed);
        if included {
            self.included.fetch_add(1, Ordering::Relaxed);
        } else {
            self.excluded.fetch_add(1, Ordering::Relaxed);
        }
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.check_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(crate) fn record_truncated(&self, count: usize) {
        self.truncated.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> FilterStats {
        let checked = self.checked.load(Ordering::Relaxed);
        let nanos = self.check_nanos.load(Ordering::Relaxed);
        FilterStats {
            total_checked: checked,
            included: self.included.load(Ordering::Relaxed),
            excluded: self.excluded.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            avg_check_us: if checked == 0 {
                0.0
            } else {
                nanos as f64 / checked as f64 / 1_000.0
            },
        }
    }
}
