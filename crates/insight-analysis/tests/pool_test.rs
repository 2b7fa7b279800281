//! Integration tests for the worker pool: ordering, timeouts, crash
//! isolation, and shutdown.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use insight_analysis::classify::{FileType, RiskTier};
use insight_analysis::detectors::{DetectionContext, Detector, DetectorTarget, Issue, Severity};
use insight_analysis::executor::TaskPlanner;
use insight_analysis::pool::{WorkerPool, WorkerPoolConfig};
use insight_core::errors::DetectionError;

// ---- Test detectors ----

type Timeline = Arc<Mutex<Vec<(String, Instant, Instant)>>>;

/// Sleeps, then records when it ran.
struct Recording {
    sleep: Duration,
    timeline: Timeline,
}

impl Detector for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn detect(&self, target: &DetectorTarget, _ctx: &DetectionContext) -> Result<Vec<Issue>, DetectionError> {
        let start = Instant::now();
        thread::sleep(self.sleep);
        self.timeline
            .lock()
            .unwrap()
            .push((target.path.clone(), start, Instant::now()));
        Ok(vec![Issue::new(1, Severity::Low, "seen")])
    }
}

/// Never finishes unless cancelled.
struct Hanging;

impl Detector for Hanging {
    fn name(&self) -> &str {
        "hanging"
    }

    fn detect(&self, _target: &DetectorTarget, ctx: &DetectionContext) -> Result<Vec<Issue>, DetectionError> {
        let give_up = Instant::now() + Duration::from_secs(20);
        while !ctx.is_cancelled() && Instant::now() < give_up {
            thread::sleep(Duration::from_millis(5));
        }
        Err(DetectionError::Cancelled {
            detector: "hanging".into(),
        })
    }
}

/// Sleeps through its whole budget without looking at the cancellation token.
struct Stubborn {
    sleep: Duration,
}

impl Detector for Stubborn {
    fn name(&self) -> &str {
        "stubborn"
    }

    fn detect(&self, _target: &DetectorTarget, _ctx: &DetectionContext) -> Result<Vec<Issue>, DetectionError> {
        thread::sleep(self.sleep);
        Ok(Vec::new())
    }
}

struct Panicking;

impl Detector for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn detect(&self, _target: &DetectorTarget, _ctx: &DetectionContext) -> Result<Vec<Issue>, DetectionError> {
        panic!("detector bug");
    }
}

struct Failing;

impl Detector for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn detect(&self, _target: &DetectorTarget, _ctx: &DetectionContext) -> Result<Vec<Issue>, DetectionError> {
        Err(DetectionError::failed("failing", "tool not installed"))
    }
}

struct Quick;

impl Detector for Quick {
    fn name(&self) -> &str {
        "quick"
    }

    fn detect(&self, target: &DetectorTarget, _ctx: &DetectionContext) -> Result<Vec<Issue>, DetectionError> {
        Ok(vec![Issue::new(7, Severity::Medium, format!("checked {}", target.path))])
    }
}

/// Tracks the peak number of concurrent invocations.
struct Concurrency {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Detector for Concurrency {
    fn name(&self) -> &str {
        "concurrency"
    }

    fn detect(&self, _target: &DetectorTarget, _ctx: &DetectionContext) -> Result<Vec<Issue>, DetectionError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

// ---- Helpers ----

const ALL: &[&str] = &[
    "recording",
    "hanging",
    "stubborn",
    "panicking",
    "failing",
    "quick",
    "concurrency",
    "external",
];

fn target(path: &str, risk: RiskTier) -> Arc<DetectorTarget> {
    Arc::new(DetectorTarget {
        path: path.to_string(),
        absolute: PathBuf::from("/nonexistent").join(path),
        file_type: FileType::Source,
        risk,
        language: None,
        allowed_detectors: ALL.to_vec(),
    })
}

fn pool(workers: usize, timeout_ms: u64) -> WorkerPool {
    WorkerPool::new(WorkerPoolConfig::new(workers, Duration::from_millis(timeout_ms))).unwrap()
}

fn plan(
    detectors: &[Arc<dyn Detector>],
    files: &[&str],
    timeout_ms: u64,
) -> Vec<insight_analysis::executor::DetectorTask> {
    let targets: Vec<_> = files.iter().map(|f| target(f, RiskTier::Medium)).collect();
    TaskPlanner::new(Duration::from_millis(timeout_ms)).plan(detectors, &targets)
}

// ---- Ordering and bounds ----

#[test]
fn single_worker_runs_tasks_one_after_another() {
    let timeline: Timeline = Arc::default();
    let detector: Arc<dyn Detector> = Arc::new(Recording {
        sleep: Duration::from_millis(80),
        timeline: Arc::clone(&timeline),
    });
    let mut pool = pool(1, 5_000);

    let results = pool.run_batch(plan(&[detector], &["first.ts", "second.ts"], 5_000));

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_clean()));
    let timeline = timeline.lock().unwrap();
    assert_eq!(timeline.len(), 2);
    let (first, second) = (&timeline[0], &timeline[1]);
    assert_eq!(first.0, "first.ts");
    assert!(second.1 >= first.2, "second task started before the first finished");
}

#[test]
fn concurrency_never_exceeds_max_workers() {
    let detector = Arc::new(Concurrency {
        current: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let as_dyn: Arc<dyn Detector> = detector.clone();
    let files: Vec<String> = (0..12).map(|i| format!("f{i}.ts")).collect();
    let files: Vec<&str> = files.iter().map(String::as_str).collect();
    let mut pool = pool(3, 5_000);

    let results = pool.run_batch(plan(&[as_dyn], &files, 5_000));

    assert_eq!(results.len(), 12);
    let peak = detector.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak}");
}

#[test]
fn results_come_back_in_task_order() {
    let detectors: Vec<Arc<dyn Detector>> = vec![Arc::new(Quick)];
    let files: Vec<String> = (0..20).map(|i| format!("src/{i}.ts")).collect();
    let files: Vec<&str> = files.iter().map(String::as_str).collect();
    let mut pool = pool(4, 5_000);

    let results = pool.run_batch(plan(&detectors, &files, 5_000));

    let got: Vec<&str> = results.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(got, files);
    assert_eq!(results[3].issues[0].file, "src/3.ts");
    assert_eq!(results[3].issues[0].detector, "quick");
    assert_eq!(results[3].issues[0].category, "quick");
}

#[test]
fn priority_dispatch_runs_high_risk_first() {
    let timeline: Timeline = Arc::default();
    let detector: Arc<dyn Detector> = Arc::new(Recording {
        sleep: Duration::from_millis(5),
        timeline: Arc::clone(&timeline),
    });
    let config = WorkerPoolConfig::new(1, Duration::from_secs(5)).with_priority_dispatch(true);
    let mut pool = WorkerPool::new(config).unwrap();
    let targets = vec![
        target("docs.md", RiskTier::Low),
        target(".env", RiskTier::Critical),
        target("main.tf", RiskTier::High),
    ];
    let tasks = TaskPlanner::new(Duration::from_secs(5)).plan(&[detector], &targets);

    let results = pool.run_batch(tasks);

    // Results stay in task order; execution followed risk.
    assert_eq!(results[0].file, "docs.md");
    let ran: Vec<String> = timeline.lock().unwrap().iter().map(|t| t.0.clone()).collect();
    assert_eq!(ran, vec![".env", "main.tf", "docs.md"]);
}

// ---- Fault isolation ----

#[test]
fn timeout_is_reported_and_pool_stays_usable() {
    let hanging: Arc<dyn Detector> = Arc::new(Hanging);
    let mut pool = pool(1, 100);

    let start = Instant::now();
    let results = pool.run_batch(plan(&[hanging], &["slow.ts"], 100));
    let elapsed = start.elapsed();

    assert_eq!(results.len(), 1);
    assert!(results[0].timed_out);
    assert!(!results[0].crashed);
    assert!(results[0].issues.is_empty());
    assert!(elapsed < Duration::from_millis(100) + Duration::from_secs(2), "took {elapsed:?}");

    let quick: Arc<dyn Detector> = Arc::new(Quick);
    let results = pool.run_batch(plan(&[quick], &["after.ts"], 1_000));
    assert!(results[0].is_clean());
    assert_eq!(results[0].issues.len(), 1);

    let stats = pool.stats();
    assert_eq!(stats.tasks_timed_out, 1);
    assert_eq!(stats.workers_replaced, 1);
    assert_eq!(stats.active_workers, 1);
}

#[test]
fn panicking_detector_crashes_only_its_task() {
    let detectors: Vec<Arc<dyn Detector>> = vec![Arc::new(Panicking), Arc::new(Quick)];
    let mut pool = pool(2, 5_000);

    let results = pool.run_batch(plan(&detectors, &["a.ts", "b.ts"], 5_000));

    assert_eq!(results.len(), 4);
    for r in &results {
        match r.detector.as_str() {
            "panicking" => {
                assert!(r.crashed);
                assert!(r.issues.is_empty());
            }
            _ => {
                assert!(r.is_clean());
                assert_eq!(r.issues.len(), 1);
            }
        }
    }
    assert_eq!(pool.stats().tasks_crashed, 2);
    assert_eq!(pool.stats().active_workers, 2);
}

#[test]
fn detector_error_is_a_crashed_result() {
    let detectors: Vec<Arc<dyn Detector>> = vec![Arc::new(Failing), Arc::new(Quick)];
    let mut pool = pool(2, 5_000);

    let results = pool.run_batch(plan(&detectors, &["a.ts"], 5_000));

    assert!(results[0].crashed);
    assert!(results[0].errors[0].contains("tool not installed"));
    assert!(results[1].is_clean());
    // A detector error does not take the worker down.
    assert_eq!(pool.stats().workers_replaced, 0);
}

// ---- Shutdown ----

#[test]
fn shutdown_is_idempotent_without_tasks() {
    let mut pool = pool(2, 1_000);
    pool.shutdown();
    pool.shutdown();
    assert!(pool.is_shut_down());
    assert_eq!(pool.stats().active_workers, 0);
}

#[test]
fn batch_after_shutdown_is_cancelled() {
    let mut pool = pool(1, 1_000);
    pool.shutdown();
    let quick: Arc<dyn Detector> = Arc::new(Quick);
    let results = pool.run_batch(plan(&[quick], &["a.ts", "b.ts"], 1_000));
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.cancelled));
}

#[test]
fn shutdown_handle_cancels_running_batch() {
    let hanging: Arc<dyn Detector> = Arc::new(Hanging);
    let mut pool = pool(1, 30_000);
    let handle = pool.shutdown_handle();

    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        handle.shutdown();
    });
    let start = Instant::now();
    let results = pool.run_batch(plan(&[hanging], &["a.ts", "b.ts", "c.ts"], 30_000));
    trigger.join().unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.cancelled));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(pool.is_shut_down());
}

#[test]
fn shutdown_handle_does_not_wait_for_detector_ignoring_cancellation() {
    let stubborn: Arc<dyn Detector> = Arc::new(Stubborn {
        sleep: Duration::from_secs(4),
    });
    let mut pool = pool(1, 30_000);
    let handle = pool.shutdown_handle();

    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        handle.shutdown();
    });
    let start = Instant::now();
    let results = pool.run_batch(plan(&[stubborn], &["a.ts", "b.ts"], 30_000));
    let elapsed = start.elapsed();
    trigger.join().unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.cancelled));
    assert!(elapsed < Duration::from_secs(2), "shutdown waited {elapsed:?}");
    assert!(pool.is_shut_down());
    assert_eq!(pool.stats().active_workers, 0);
}

// ---- External tools ----

#[cfg(unix)]
fn process_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .args(["-0", pid])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(unix)]
#[test]
fn timed_out_external_tool_is_killed() {
    use insight_analysis::detectors::CommandDetector;

    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("tool.pid");
    let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
    let tool: Arc<dyn Detector> = Arc::new(CommandDetector::new(
        "external",
        "sh",
        vec!["-c".to_string(), script],
    ));
    let mut pool = pool(1, 300);

    let start = Instant::now();
    let results = pool.run_batch(plan(&[tool], &["a.ts"], 300));
    let elapsed = start.elapsed();

    assert!(results[0].timed_out);
    assert!(elapsed < Duration::from_millis(300) + Duration::from_secs(2), "took {elapsed:?}");

    let pid = std::fs::read_to_string(&pid_file).unwrap();
    let pid = pid.trim();
    assert!(!pid.is_empty());
    let deadline = Instant::now() + Duration::from_secs(3);
    while process_alive(pid) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert!(!process_alive(pid), "external tool {pid} survived the timeout");
}
