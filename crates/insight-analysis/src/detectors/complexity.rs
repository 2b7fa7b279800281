//! Nesting-depth and file-size heuristics.

use insight_core::errors::DetectionError;

use super::traits::{DetectionContext, Detector, DetectorTarget};
use super::types::{Issue, Severity};

const DEFAULT_MAX_DEPTH: u64 = 5;
const DEFAULT_MAX_LINES: u64 = 1_000;
const DEFAULT_INDENT_WIDTH: u64 = 4;

/// Flags blocks nested deeper than `max_depth` indentation levels and
/// files longer than `max_lines`.
///
/// Settings (`[detectors.complexity]`): `max_depth`, `max_lines`, `indent_width`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityDetector;

impl ComplexityDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for ComplexityDetector {
    fn name(&self) -> &str {
        "complexity"
    }

    fn category(&self) -> &str {
        "maintainability"
    }

    fn detect(
        &self,
        target: &DetectorTarget,
        ctx: &DetectionContext,
    ) -> Result<Vec<Issue>, DetectionError> {
        let max_depth = ctx.setting_u64("max_depth", DEFAULT_MAX_DEPTH);
        let max_lines = ctx.setting_u64("max_lines", DEFAULT_MAX_LINES);
        let indent_width = ctx.setting_u64("indent_width", DEFAULT_INDENT_WIDTH).max(1);

        let bytes = std::fs::read(&target.absolute).map_err(|e| DetectionError::Io {
            detector: self.name().to_string(),
            path: target.path.clone(),
            message: e.to_string(),
        })?;
        let content = String::from_utf8_lossy(&bytes);

        let mut issues = Vec::new();
        let mut inside_deep_block = false;
        let mut line_count: u64 = 0;

        for (idx, line) in content.lines().enumerate() {
            line_count += 1;
            if idx % 512 == 0 && ctx.is_cancelled() {
                return Err(DetectionError::Cancelled {
                    detector: self.name().to_string(),
                });
            }
            if line.trim().is_empty() {
                continue;
            }
            let depth = indent_columns(line) / indent_width;
            if depth > max_depth {
                // One issue per deep block, at the line where it starts.
                if !inside_deep_block {
                    issues.push(
                        Issue::new(
                            idx as u32 + 1,
                            Severity::Medium,
                            format!("Nesting depth {depth} exceeds {max_depth}"),
                        )
                        .with_confidence(0.5),
                    );
                }
                inside_deep_block = true;
            } else {
                inside_deep_block = false;
            }
        }

        if line_count > max_lines {
            issues.push(
                Issue::new(
                    0,
                    Severity::Low,
                    format!("File has {line_count} lines (limit {max_lines})"),
                )
                .with_confidence(1.0),
            );
        }

        Ok(issues)
    }
}

/// Leading whitespace width, tabs counted as one indent step of four columns.
fn indent_columns(line: &str) -> u64 {
    let mut columns = 0;
    for ch in line.chars() {
        match ch {
            ' ' => columns += 1,
            '\t' => columns += DEFAULT_INDENT_WIDTH,
            _ => break,
        }
    }
    columns
}
