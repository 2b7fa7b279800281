//! Append-only record of file routing decisions.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::summary::SkipReason;
use crate::classify::{Classification, FileType, RiskTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Routing {
    Analyze,
    Skip,
}

/// One routing decision. Serialized as one JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub path: String,
    pub decision: Routing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskTier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detectors: Vec<String>,
}

/// In-memory audit trail, optionally mirrored to a JSONL file.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
    flushed: usize,
    path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn record_analyze(&mut self, path: &str, classification: &Classification) {
        self.records.push(AuditRecord {
            timestamp_ms: now_ms(),
            path: path.to_string(),
            decision: Routing::Analyze,
            reason: None,
            file_type: Some(classification.file_type),
            risk: Some(classification.risk),
            detectors: classification
                .allowed_detectors
                .iter()
                .map(|d| d.to_string())
                .collect(),
        });
    }

    pub fn record_skip(&mut self, path: &str, reason: SkipReason, classification: Option<&Classification>) {
        self.records.push(AuditRecord {
            timestamp_ms: now_ms(),
            path: path.to_string(),
            decision: Routing::Skip,
            reason: Some(reason),
            file_type: classification.map(|c| c.file_type),
            risk: classification.map(|c| c.risk),
            detectors: Vec::new(),
        });
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Records added since `start`.
    pub fn since(&self, start: usize) -> &[AuditRecord] {
        &self.records[start.min(self.records.len())..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append unwritten records to the file, one JSON object per line.
    /// Without a file this only marks them written.
    pub fn flush(&mut self) -> io::Result<usize> {
        let pending = &self.records[self.flushed..];
        let count = pending.len();
        if let Some(path) = &self.path {
            if count > 0 {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = String::new();
                for record in pending {
                    let line = serde_json::to_string(record).map_err(io::Error::other)?;
                    out.push_str(&line);
                    out.push('\n');
                }
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(out.as_bytes())?;
            }
        }
        self.flushed = self.records.len();
        Ok(count)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/audit.jsonl");
        let mut log = AuditLog::new(Some(path.clone()));

        log.record_skip("a.log", SkipReason::Truncated, None);
        assert_eq!(log.flush().unwrap(), 1);
        log.record_skip("b.log", SkipReason::Unchanged, None);
        assert_eq!(log.flush().unwrap(), 1);
        assert_eq!(log.flush().unwrap(), 0);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["decision"], "skip");
        assert_eq!(second["reason"]["reason"], "unchanged");
    }
}
