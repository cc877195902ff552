//! Readability: cyclomatic complexity and PEP 8 style
//!
//! Score = 0.6 × complexity_score + 0.4 × style_score, then size-adjusted.
//! Style violations come from `ruff` (E/W rules) when it is installed and from a
//! small built-in line checker otherwise.

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use super::external_tool::{argv, is_tool_installed, run_external_tool};
use crate::error::BenchError;
use crate::models::AssessmentOutcome;
use crate::parsers;
use crate::scoring::{adjust_for_size, clamp_score, classify_codebase, MetricKind};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Functions above this complexity are listed individually
const HIGH_COMPLEXITY: u32 = 10;
const MAX_LINE_LENGTH: usize = 79;

pub struct ReadabilityAssessor {
    timeout_secs: u64,
}

impl ReadabilityAssessor {
    pub fn new(settings: &AssessorSettings) -> Self {
        Self {
            timeout_secs: settings.tool_timeout_secs,
        }
    }
}

struct StyleReport {
    violations: usize,
    checker: &'static str,
}

impl Assessor for ReadabilityAssessor {
    fn id(&self) -> &'static str {
        "readability"
    }

    fn description(&self) -> &'static str {
        "Cyclomatic complexity and PEP 8 style violations"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        let files = parsers::python_files(codebase);
        if files.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }

        let parsed = parsers::parse_files(&files);
        let mut details = Vec::new();
        let mut total_complexity = 0u32;
        let mut function_count = 0usize;

        for file in &parsed.files {
            for func in file.functions() {
                if func.complexity > HIGH_COMPLEXITY {
                    details.push(format!(
                        "High complexity ({}) in function '{}' at {}:{}",
                        func.complexity,
                        func.name,
                        file.path.display(),
                        func.line
                    ));
                }
                total_complexity += func.complexity;
                function_count += 1;
            }
        }

        let avg_complexity = if function_count > 0 {
            total_complexity as f64 / function_count as f64
        } else {
            0.0
        };
        let complexity_score = (10.0 - (avg_complexity - 5.0)).max(0.0);
        details.push(format!("Average cyclomatic complexity: {:.2}", avg_complexity));

        let style = self.count_style_violations(codebase, &files);
        details.push(format!("Found {} PEP8 style violations.", style.violations));
        let style_score = (10.0 - style.violations as f64 / 5.0).max(0.0);

        let raw_score = clamp_score(0.6 * complexity_score + 0.4 * style_score);
        let bucket = classify_codebase(codebase);
        let adjusted = adjust_for_size(raw_score, bucket, MetricKind::Readability);

        Ok(AssessmentOutcome::new(adjusted, details)
            .with_metric("avg_complexity", avg_complexity)
            .with_metric("function_count", function_count)
            .with_metric("style_violations", style.violations)
            .with_metric("style_checker", style.checker)
            .with_metric("size_bucket", bucket.as_str())
            .with_metric("unadjusted_score", raw_score))
    }
}

impl ReadabilityAssessor {
    fn count_style_violations(&self, codebase: &Path, files: &[PathBuf]) -> StyleReport {
        if is_tool_installed("ruff") {
            let cmd = argv([
                "ruff",
                "check",
                "--select",
                "E,W",
                "--output-format",
                "json",
                "--exit-zero",
                "--no-cache",
                "--line-length",
                "79",
            ])
            .into_iter()
            .chain(std::iter::once(codebase.display().to_string()))
            .collect::<Vec<_>>();

            match run_external_tool(&cmd, "ruff", self.timeout_secs, None, None)
                .and_then(|out| out.json())
            {
                Ok(report) => {
                    if let Some(entries) = report.as_array() {
                        return StyleReport {
                            violations: entries.len(),
                            checker: "ruff",
                        };
                    }
                    debug!("ruff returned non-array JSON; using built-in style checks");
                }
                Err(e) => debug!("{}; using built-in style checks", BenchError::from(e)),
            }
        }

        let violations = files
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .map(|source| builtin_style_violations(&source))
            .sum::<usize>();
        debug!("Built-in style check over {} files", files.len());
        StyleReport {
            violations,
            checker: "builtin",
        }
    }
}

/// Line-level subset of pycodestyle: E501, W191, W291/W293, W391.
fn builtin_style_violations(source: &str) -> usize {
    let mut count = 0;
    for line in source.lines() {
        if line.chars().count() > MAX_LINE_LENGTH {
            count += 1; // E501
        }
        if line.starts_with('\t') {
            count += 1; // W191
        }
        if line.ends_with([' ', '\t']) {
            count += 1; // W291 / W293
        }
    }
    if source.ends_with("\n\n") {
        count += 1; // W391
    }
    count
}
