//! Orchestration: filter → classify → change detection → execute → aggregate.

pub mod aggregate;
pub mod analysis_engine;
pub mod audit;
pub mod summary;

pub use aggregate::aggregate;
pub use analysis_engine::{AnalysisEngine, AnalysisResult, AnalyzeOptions, FileRecord};
pub use audit::{AuditLog, AuditRecord, Routing};
pub use summary::{RunSummary, SkipReason, SkippedFile};
