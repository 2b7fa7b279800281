//! Error handling for Insight.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod cache_error;
pub mod config_error;
pub mod detection_error;
pub mod error_code;
pub mod filter_error;
pub mod pipeline_error;
pub mod pool_error;

pub use cache_error::CacheError;
pub use config_error::ConfigError;
pub use detection_error::DetectionError;
pub use error_code::InsightErrorCode;
pub use filter_error::FilterError;
pub use pipeline_error::PipelineError;
pub use pool_error::PoolError;
