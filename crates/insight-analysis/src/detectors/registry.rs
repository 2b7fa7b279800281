//! DetectorRegistry: ordered, name-keyed detector collection.

use std::sync::Arc;

use insight_core::errors::ConfigError;
use insight_core::types::collections::FxHashMap;

use super::traits::Detector;
use super::{ComplexityDetector, SecretsDetector};

/// Registered detectors in registration order.
///
/// Owned by one engine instance; there is no process-wide registry.
#[derive(Default, Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn Detector>>,
    index: FxHashMap<String, usize>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the reference detectors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.detectors.push(Arc::new(SecretsDetector::new()));
        registry.detectors.push(Arc::new(ComplexityDetector::new()));
        registry.reindex();
        registry
    }

    /// Register a detector. Names must be unique.
    pub fn register(&mut self, detector: Arc<dyn Detector>) -> Result<(), ConfigError> {
        let name = detector.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ConfigError::DuplicateDetector { name });
        }
        self.index.insert(name, self.detectors.len());
        self.detectors.push(detector);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Detector>> {
        self.index.get(name).map(|&i| &self.detectors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Detector>> {
        self.detectors.iter()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    fn reindex(&mut self) {
        self.index = self
            .detectors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{DetectionContext, DetectorTarget, Issue};
    use insight_core::errors::DetectionError;

    struct Named(&'static str);

    impl Detector for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn detect(
            &self,
            _target: &DetectorTarget,
            _ctx: &DetectionContext,
        ) -> Result<Vec<Issue>, DetectionError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(Named("lint"))).unwrap();
        let err = registry.register(Arc::new(Named("lint"))).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDetector { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtins_are_registered_in_order() {
        let registry = DetectorRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["security", "complexity"]);
        assert!(registry.get("security").is_some());
    }
}
