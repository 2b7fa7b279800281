//! Sequential and parallel executors must agree on results.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use insight_analysis::classify::FileTypeClassifier;
use insight_analysis::detectors::{
    ComplexityDetector, DetectionContext, Detector, DetectorTarget, Issue, SecretsDetector,
};
use insight_analysis::engine::aggregate;
use insight_analysis::executor::{Executor, ParallelExecutor, SequentialExecutor};
use insight_analysis::pool::WorkerPoolConfig;
use insight_core::errors::DetectionError;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn targets(root: &Path, files: &[&str]) -> Vec<Arc<DetectorTarget>> {
    files
        .iter()
        .map(|rel| {
            let c = FileTypeClassifier.classify(rel);
            Arc::new(DetectorTarget {
                path: rel.to_string(),
                absolute: root.join(rel),
                file_type: c.file_type,
                risk: c.risk,
                language: c.language,
                allowed_detectors: c.allowed_detectors,
            })
        })
        .collect()
}

fn fixture() -> (tempfile::TempDir, Vec<&'static str>) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/keys.ts", "const apiKey = \"sk_live_abcdef123456\";\n");
    let deep = (0..8)
        .map(|d| format!("{}x = {d}\n", " ".repeat(d * 4)))
        .collect::<String>();
    write(root, "src/deep.py", &deep);
    write(root, ".env", "DB_PASSWORD=hunter2hunter2\nPORT=8080\n");
    write(root, "src/clean.ts", "export const x = 1;\n");
    (dir, vec!["src/keys.ts", "src/deep.py", ".env", "src/clean.ts"])
}

fn detectors() -> Vec<Arc<dyn Detector>> {
    vec![Arc::new(SecretsDetector::new()), Arc::new(ComplexityDetector::new())]
}

#[test]
fn sequential_and_parallel_produce_identical_issues() {
    let (dir, files) = fixture();
    let targets = targets(dir.path(), &files);

    let sequential = SequentialExecutor::new().run(&detectors(), &targets);
    let mut parallel_exec =
        ParallelExecutor::new(WorkerPoolConfig::new(3, Duration::from_secs(10))).unwrap();
    let parallel = parallel_exec.run(&detectors(), &targets);
    parallel_exec.shutdown();

    assert_eq!(sequential.len(), parallel.len());
    let seq_issues = aggregate(&sequential, Vec::new());
    let par_issues = aggregate(&parallel, Vec::new());
    assert_eq!(seq_issues, par_issues);

    // Secret in source, secret in .env, one deep block.
    assert!(seq_issues.iter().any(|i| i.file == "src/keys.ts" && i.detector == "security"));
    assert!(seq_issues.iter().any(|i| i.file == ".env" && i.line == 1));
    assert!(seq_issues
        .iter()
        .any(|i| i.file == "src/deep.py" && i.category == "maintainability"));
    assert!(seq_issues.iter().all(|i| i.file != "src/clean.ts"));
}

#[test]
fn env_file_only_gets_security() {
    let (dir, _) = fixture();
    let targets = targets(dir.path(), &[".env"]);
    let results = SequentialExecutor::new().run(&detectors(), &targets);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].detector, "security");
}

struct Exploding;

impl Detector for Exploding {
    fn name(&self) -> &str {
        "security"
    }

    fn detect(&self, target: &DetectorTarget, _ctx: &DetectionContext) -> Result<Vec<Issue>, DetectionError> {
        if target.path.contains("keys") {
            panic!("cannot handle {}", target.path);
        }
        Ok(Vec::new())
    }
}

#[test]
fn sequential_keeps_order_and_survives_panics() {
    let (dir, files) = fixture();
    let targets = targets(dir.path(), &files);
    let detectors: Vec<Arc<dyn Detector>> = vec![Arc::new(Exploding)];

    let results = SequentialExecutor::new().run(&detectors, &targets);

    let order: Vec<&str> = results.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(order, files);
    assert!(results[0].crashed);
    assert!(results[0].errors[0].contains("cannot handle src/keys.ts"));
    assert!(results[1..].iter().all(|r| r.is_clean()));
}

#[test]
fn missing_file_is_a_crashed_result() {
    let dir = tempfile::tempdir().unwrap();
    let targets = targets(dir.path(), &["src/gone.ts"]);
    let detectors: Vec<Arc<dyn Detector>> = vec![Arc::new(SecretsDetector::new())];

    let results = SequentialExecutor::new().run(&detectors, &targets);

    assert_eq!(results.len(), 1);
    assert!(results[0].crashed);
    assert!(results[0].issues.is_empty());
}
