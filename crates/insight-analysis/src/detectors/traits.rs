//! Detector trait and the per-invocation target/context types.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use insight_core::errors::DetectionError;
use insight_core::traits::{Cancellable, CancellationToken};

use super::types::Issue;
use crate::classify::{FileType, Language, RiskTier};

/// Trait that every detector must implement.
pub trait Detector: Send + Sync {
    /// Unique name. Also the key used by file-type compatibility lists.
    fn name(&self) -> &str;

    /// Category stamped on issues that do not set their own.
    fn category(&self) -> &str {
        self.name()
    }

    /// Per-detector time budget. `None` uses the pool's task timeout.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Run detection against one target.
    fn detect(
        &self,
        target: &DetectorTarget,
        ctx: &DetectionContext,
    ) -> Result<Vec<Issue>, DetectionError>;
}

/// One file, as seen by a detector.
#[derive(Debug, Clone)]
pub struct DetectorTarget {
    /// Workspace-relative path with `/` separators.
    pub path: String,
    /// Location on disk.
    pub absolute: PathBuf,
    pub file_type: FileType,
    pub risk: RiskTier,
    pub language: Option<Language>,
    /// Effective detector set for this file.
    pub allowed_detectors: Vec<&'static str>,
}

impl DetectorTarget {
    pub fn allows(&self, detector: &str) -> bool {
        self.allowed_detectors.iter().any(|d| *d == detector)
    }
}

/// Per-invocation context: optional settings and a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct DetectionContext {
    settings: Option<Arc<toml::Value>>,
    cancellation: CancellationToken,
}

impl DetectionContext {
    pub fn new(settings: Option<Arc<toml::Value>>, cancellation: CancellationToken) -> Self {
        Self {
            settings,
            cancellation,
        }
    }

    /// The detector's `[detectors.<name>]` table, if configured.
    pub fn settings(&self) -> Option<&toml::Value> {
        self.settings.as_deref()
    }

    /// Integer setting lookup with a fallback.
    pub fn setting_u64(&self, key: &str, default: u64) -> u64 {
        self.settings()
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_integer())
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(default)
    }

    /// Set when the task timed out or the pool is shutting down.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
