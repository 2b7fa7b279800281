//! Configuration system for Insight.
//! TOML-based, layered resolution: overrides > env > project > defaults.

pub mod cache_config;
pub mod engine_config;
pub mod filter_config;
pub mod insight_config;
pub mod pool_config;

pub use cache_config::CacheConfig;
pub use engine_config::{EngineConfig, ExecutionMode};
pub use filter_config::{FilterAction, FilterConfig};
pub use insight_config::{ConfigOverrides, InsightConfig};
pub use pool_config::PoolConfig;
