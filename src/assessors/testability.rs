//! Testability: line coverage from running the codebase's own test suite
//!
//! Runs pytest with pytest-cov into a scratch directory so nothing is left in
//! the analyzed codebase. Score is coverage percent / 10.

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use super::external_tool::{python_tool_command, read_json_report, run_external_tool, ToolError};
use crate::error::BenchError;
use crate::models::AssessmentOutcome;
use crate::parsers;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const LOW_COVERAGE_PCT: f64 = 50.0;

pub struct TestabilityAssessor {
    python: String,
    timeout_secs: u64,
}

impl TestabilityAssessor {
    pub fn new(settings: &AssessorSettings) -> Self {
        Self {
            python: settings.python.clone(),
            timeout_secs: settings.tool_timeout_secs,
        }
    }
}

/// Python files whose name mentions "test" (case-insensitive)
fn test_files(files: &[PathBuf]) -> Vec<&PathBuf> {
    files
        .iter()
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().to_lowercase().contains("test"))
                .unwrap_or(false)
        })
        .collect()
}

impl Assessor for TestabilityAssessor {
    fn id(&self) -> &'static str {
        "testability"
    }

    fn description(&self) -> &'static str {
        "Test coverage measured with pytest-cov"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        let files = parsers::python_files(codebase);
        if files.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }
        let tests = test_files(&files);
        if tests.is_empty() {
            return Ok(AssessmentOutcome::neutral(
                0.0,
                "No test files found (e.g., files named test_*.py).",
            ));
        }

        let scratch = tempfile::tempdir().context("Failed to create coverage scratch dir")?;
        let report_path = scratch.path().join("coverage.json");

        let mut env = HashMap::new();
        env.insert(
            "COVERAGE_FILE".to_string(),
            scratch.path().join(".coverage").display().to_string(),
        );
        env.insert("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string());

        let root = codebase.display().to_string();
        let mut cmd = python_tool_command(&self.python, "pytest", "pytest");
        cmd.extend([
            format!("--cov={}", root),
            format!("--cov-report=json:{}", report_path.display()),
            "-p".to_string(),
            "no:cacheprovider".to_string(),
            "-q".to_string(),
            root,
        ]);

        match run_external_tool(&cmd, "pytest", self.timeout_secs, Some(codebase), Some(&env)) {
            Ok(out) => debug!("pytest exited with {:?}", out.return_code),
            Err(ToolError::TimedOut { secs, .. }) => {
                return Ok(AssessmentOutcome::neutral(
                    0.0,
                    format!("pytest timed out after {}s.", secs),
                ));
            }
            Err(e) => {
                debug!("{}", BenchError::from(e));
                return Ok(AssessmentOutcome::neutral(
                    0.0,
                    "Could not run pytest. Is it installed and in your PATH?",
                ));
            }
        }

        if !report_path.exists() {
            return Ok(AssessmentOutcome::neutral(
                0.0,
                "Coverage report (coverage.json) was not generated. Tests may have failed.",
            ));
        }

        let coverage = read_json_report("coverage", &report_path).ok().and_then(|report| {
            report
                .get("totals")
                .and_then(|totals| totals.get("percent_covered"))
                .and_then(|pct| pct.as_f64())
        });
        let Some(coverage) = coverage else {
            return Ok(AssessmentOutcome::neutral(0.0, "Could not parse coverage report."));
        };

        let mut details = vec![format!("Test coverage: {:.2}%", coverage)];
        if coverage < LOW_COVERAGE_PCT {
            details.push("Low coverage. Consider adding more tests for critical paths.".to_string());
        }

        Ok(AssessmentOutcome::new(coverage / 10.0, details)
            .with_metric("test_files", tests.len())
            .with_metric("coverage_percent", coverage))
    }
}
