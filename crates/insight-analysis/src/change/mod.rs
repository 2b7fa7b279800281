//! Content-hash change detection with a persisted cache.

pub mod change_detector;
pub mod hasher;
pub mod store;

pub use change_detector::{entry_now, ChangeDetector, ChangeStats, ChangeStatus};
pub use hasher::{hash_content, FileDigest};
pub use store::CacheEntry;
