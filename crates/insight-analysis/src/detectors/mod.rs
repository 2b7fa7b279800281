//! Detector contract, issue model, registry, and a few reference detectors.
//!
//! Every analysis routine implements [`Detector`]: given a target, produce
//! issues, and possibly fail. The executors take care of failures, hangs and
//! crashes; detectors never need to guard against each other.

pub mod command;
pub mod complexity;
pub mod registry;
pub mod secrets;
pub mod traits;
pub mod types;

pub use command::CommandDetector;
pub use complexity::ComplexityDetector;
pub use registry::DetectorRegistry;
pub use secrets::SecretsDetector;
pub use traits::{DetectionContext, Detector, DetectorTarget};
pub use types::{Issue, Severity};
