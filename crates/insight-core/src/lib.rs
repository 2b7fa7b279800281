//! Core types, configuration, errors, events and tracing for the Insight
//! detector execution engine.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod traits;
pub mod types;
