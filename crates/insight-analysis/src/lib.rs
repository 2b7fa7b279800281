//! Detector execution engine.
//!
//! Decides which files need (re-)analysis, runs independent detectors against
//! them under bounded concurrency with crash/timeout isolation, and aggregates
//! the results into a stable, deterministic issue list.
//!
//! Pipeline: [`filter`] → [`classify`] → [`change`] → [`executor`] (sequential
//! or [`pool`]-backed) → [`engine`] aggregation.

#[macro_use]
mod levels;

pub mod change;
pub mod classify;
pub mod detectors;
pub mod engine;
pub mod executor;
pub mod filter;
pub mod pool;

pub use engine::{AnalysisEngine, AnalysisResult, AnalyzeOptions};
