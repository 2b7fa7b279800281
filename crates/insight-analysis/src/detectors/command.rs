//! Detector backed by an external command-line tool.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use insight_core::errors::DetectionError;

use super::traits::{DetectionContext, Detector, DetectorTarget};
use super::types::{Issue, Severity};

/// How often a running child is polled for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs an external program per file and parses one JSON issue per stdout line.
///
/// Every `{file}` in `args` is replaced with the target's absolute path.
/// Expected line shape:
/// `{"line": 3, "column": 7, "severity": "warning", "message": "...", "category": "...", "confidence": 0.8}`.
/// Lines that are not JSON objects are ignored. A non-zero exit with no
/// parseable output is a failure.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    name: String,
    category: String,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct ToolIssue {
    #[serde(default)]
    line: u32,
    column: Option<u32>,
    severity: Option<String>,
    message: String,
    category: Option<String>,
    confidence: Option<f64>,
}

impl CommandDetector {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        let name = name.into();
        Self {
            category: name.clone(),
            name,
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn failed(&self, message: impl Into<String>) -> DetectionError {
        DetectionError::failed(self.name.clone(), message)
    }

    fn parse_output(&self, stdout: &str) -> Vec<Issue> {
        stdout
            .lines()
            .filter(|l| l.trim_start().starts_with('{'))
            .filter_map(|l| serde_json::from_str::<ToolIssue>(l).ok())
            .map(|t| {
                let severity = t
                    .severity
                    .as_deref()
                    .and_then(Severity::parse)
                    .unwrap_or(Severity::Medium);
                let mut issue = Issue::new(t.line, severity, t.message);
                issue.column = t.column;
                if let Some(category) = t.category {
                    issue.category = category;
                }
                if let Some(confidence) = t.confidence {
                    issue = issue.with_confidence(confidence);
                }
                issue
            })
            .collect()
    }
}

impl Detector for CommandDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn detect(
        &self,
        target: &DetectorTarget,
        ctx: &DetectionContext,
    ) -> Result<Vec<Issue>, DetectionError> {
        let file = target.absolute.to_string_lossy();
        let args: Vec<String> = self.args.iter().map(|a| a.replace("{file}", &file)).collect();

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failed(format!("failed to start {}: {e}", self.program)))?;

        // Drain pipes on helper threads so a chatty tool cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            if ctx.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(DetectionError::Cancelled {
                    detector: self.name.clone(),
                });
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(self.failed(format!("waiting for {}: {e}", self.program))),
            }
        };

        let stdout = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();

        let issues = self.parse_output(&stdout);
        if !status.success() && issues.is_empty() {
            let detail = stderr.lines().next().unwrap_or("no output");
            return Err(self.failed(format!("{} exited with {status}: {detail}", self.program)));
        }
        Ok(issues)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}
