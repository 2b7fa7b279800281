//! File classification: semantic type, risk tier, language, and the
//! compatible-detector set for each path.

pub mod classifier;
pub mod file_type;
pub mod language_detect;

pub use classifier::{Classification, ClassifiedBatch, FileTypeClassifier};
pub use file_type::{is_routable_detector, FileType, RiskTier};
pub use language_detect::Language;
