//! Detector tasks, their results, and the planner that pairs detectors with targets.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::trace;

use insight_core::errors::DetectionError;
use insight_core::tracing::metrics;
use insight_core::traits::CancellationToken;
use insight_core::types::collections::FxHashMap;

use crate::classify::RiskTier;
use crate::detectors::{DetectionContext, Detector, DetectorTarget, Issue};

/// One detector invocation against one target.
#[derive(Clone)]
pub struct DetectorTask {
    pub detector: Arc<dyn Detector>,
    pub target: Arc<DetectorTarget>,
    pub timeout: Duration,
    pub settings: Option<Arc<toml::Value>>,
}

impl DetectorTask {
    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    pub fn file(&self) -> &str {
        &self.target.path
    }

    pub fn risk(&self) -> RiskTier {
        self.target.risk
    }
}

impl fmt::Debug for DetectorTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorTask")
            .field("detector", &self.detector.name())
            .field("file", &self.target.path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Outcome of one task. Always produced, even when the detector failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub detector: String,
    pub file: String,
    pub issues: Vec<Issue>,
    pub errors: Vec<String>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub crashed: bool,
    pub timed_out: bool,
    pub cancelled: bool,
}

impl DetectorResult {
    fn empty(detector: &str, file: &str, duration: Duration) -> Self {
        Self {
            detector: detector.to_string(),
            file: file.to_string(),
            issues: Vec::new(),
            errors: Vec::new(),
            duration,
            crashed: false,
            timed_out: false,
            cancelled: false,
        }
    }

    pub fn completed(task: &DetectorTask, issues: Vec<Issue>, duration: Duration) -> Self {
        Self {
            issues,
            ..Self::empty(task.detector_name(), task.file(), duration)
        }
    }

    pub fn crashed(detector: &str, file: &str, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            errors: vec![message.into()],
            crashed: true,
            ..Self::empty(detector, file, duration)
        }
    }

    pub fn timed_out(detector: &str, file: &str, timeout: Duration, elapsed: Duration) -> Self {
        let err = DetectionError::Timeout {
            detector: detector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };
        Self {
            errors: vec![err.to_string()],
            timed_out: true,
            ..Self::empty(detector, file, elapsed)
        }
    }

    pub fn cancelled(detector: &str, file: &str, elapsed: Duration) -> Self {
        let err = DetectionError::Cancelled {
            detector: detector.to_string(),
        };
        Self {
            errors: vec![err.to_string()],
            cancelled: true,
            ..Self::empty(detector, file, elapsed)
        }
    }

    /// Finished normally; issues are complete.
    pub fn is_clean(&self) -> bool {
        !self.crashed && !self.timed_out && !self.cancelled
    }
}

/// Run one task on the current thread. Detector errors become a crashed
/// result; panics are not caught here.
pub fn run_task(task: &DetectorTask, cancellation: CancellationToken) -> DetectorResult {
    let start = Instant::now();
    let ctx = DetectionContext::new(task.settings.clone(), cancellation);
    let outcome = task.detector.detect(&task.target, &ctx);
    trace!(
        detector = task.detector_name(),
        file = task.file(),
        ok = outcome.is_ok(),
        { metrics::DETECTION_TIME_PER_DETECTOR } = start.elapsed().as_millis() as u64,
        "detector returned"
    );
    match outcome {
        Ok(mut issues) => {
            let category = task.detector.category();
            for issue in &mut issues {
                issue.file = task.target.path.clone();
                issue.detector = task.detector_name().to_string();
                if issue.category.is_empty() {
                    issue.category = category.to_string();
                }
            }
            DetectorResult::completed(task, issues, start.elapsed())
        }
        Err(DetectionError::Cancelled { .. }) => {
            DetectorResult::cancelled(task.detector_name(), task.file(), start.elapsed())
        }
        Err(e) => DetectorResult::crashed(task.detector_name(), task.file(), e.to_string(), start.elapsed()),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Builds the (detector × target) task list.
#[derive(Debug, Clone)]
pub struct TaskPlanner {
    default_timeout: Duration,
    settings: FxHashMap<String, Arc<toml::Value>>,
}

impl TaskPlanner {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            settings: FxHashMap::default(),
        }
    }

    /// Per-detector settings tables, keyed by detector name.
    pub fn with_settings<'a>(
        mut self,
        settings: impl IntoIterator<Item = (&'a String, &'a toml::Value)>,
    ) -> Self {
        self.settings = settings
            .into_iter()
            .map(|(k, v)| (k.clone(), Arc::new(v.clone())))
            .collect();
        self
    }

    /// One task per target and allowed detector. Targets in input order,
    /// detectors in registry order within each target.
    pub fn plan(
        &self,
        detectors: &[Arc<dyn Detector>],
        targets: &[Arc<DetectorTarget>],
    ) -> Vec<DetectorTask> {
        let mut tasks = Vec::new();
        for target in targets {
            for detector in detectors {
                if !target.allows(detector.name()) {
                    continue;
                }
                tasks.push(DetectorTask {
                    detector: Arc::clone(detector),
                    target: Arc::clone(target),
                    timeout: detector.timeout().unwrap_or(self.default_timeout),
                    settings: self.settings.get(detector.name()).cloned(),
                });
            }
        }
        tasks
    }
}

// Custom serialization for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
