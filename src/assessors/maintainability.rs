//! Maintainability: per-file maintainability index (MI)
//!
//! Uses `radon mi` when available. Without radon the MI is estimated from the
//! syntax tree with the same formula radon uses:
//!
//! ```text
//! MI = max(0, (171 - 5.2 ln V - 0.23 G - 16.2 ln L + 50 sin(sqrt(2.46 C))) × 100 / 171)
//! ```
//!
//! where V is the Halstead volume, G the summed cyclomatic complexity, L the
//! source lines and C the comment ratio in radians.

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use super::external_tool::{argv, is_tool_installed, run_external_tool};
use crate::error::BenchError;
use crate::models::AssessmentOutcome;
use crate::parsers::{self, python, ParsedFile};
use crate::scoring::{
    adjust_for_size, classify_codebase, confidence_interval, MetricKind, DEFAULT_CONFIDENCE,
};
use anyhow::Result;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const LOW_MI: f64 = 40.0;

pub struct MaintainabilityAssessor {
    timeout_secs: u64,
}

impl MaintainabilityAssessor {
    pub fn new(settings: &AssessorSettings) -> Self {
        Self {
            timeout_secs: settings.tool_timeout_secs,
        }
    }
}

/// MI for one file; `None` means the file could not be scored.
struct FileMi {
    path: PathBuf,
    mi: Option<f64>,
}

impl Assessor for MaintainabilityAssessor {
    fn id(&self) -> &'static str {
        "maintainability"
    }

    fn description(&self) -> &'static str {
        "Maintainability index per file, size-adjusted"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        let files = parsers::python_files(codebase);
        if files.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }

        let (scores, source) = match self.radon_scores(&files) {
            Some(scores) => (scores, "radon"),
            None => (estimate_scores(&files), "builtin"),
        };

        let mut details = Vec::new();
        let mut file_mis = Vec::new();
        for FileMi { path, mi } in &scores {
            match mi {
                Some(mi) => {
                    if *mi < LOW_MI {
                        details.push(format!(
                            "Low maintainability index ({:.2}) in {}",
                            mi,
                            path.display()
                        ));
                    }
                    file_mis.push(*mi);
                }
                None => details.push(format!("Could not parse {}", path.display())),
            }
        }

        if file_mis.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, "No parseable Python files found."));
        }

        let avg_mi = file_mis.iter().sum::<f64>() / file_mis.len() as f64;
        let raw_score = avg_mi / 10.0;
        let bucket = classify_codebase(codebase);
        let adjusted = adjust_for_size(raw_score, bucket, MetricKind::Maintainability);

        details.insert(
            0,
            format!(
                "Average maintainability index (MI): {:.2} (size: {})",
                avg_mi, bucket
            ),
        );

        let (low, high) = confidence_interval(&file_mis, DEFAULT_CONFIDENCE);

        Ok(AssessmentOutcome::new(adjusted.clamp(0.0, 10.0), details)
            .with_metric("file_mi_scores", file_mis)
            .with_metric("avg_mi", avg_mi)
            .with_metric("size_bucket", bucket.as_str())
            .with_metric("unadjusted_score", raw_score)
            .with_metric("mi_source", source)
            .with_confidence_interval((low / 10.0, high / 10.0)))
    }
}

impl MaintainabilityAssessor {
    /// `radon mi --json -s`; `None` when radon is missing or its output is unusable.
    fn radon_scores(&self, files: &[PathBuf]) -> Option<Vec<FileMi>> {
        if !is_tool_installed("radon") {
            debug!("radon not installed; estimating maintainability index");
            return None;
        }

        let mut cmd = argv(["radon", "mi", "--json", "-s"]);
        cmd.extend(files.iter().map(|f| f.display().to_string()));
        let report = match run_external_tool(&cmd, "radon", self.timeout_secs, None, None)
            .and_then(|out| out.json())
        {
            Ok(report) => report,
            Err(e) => {
                debug!("{}; estimating maintainability index", BenchError::from(e));
                return None;
            }
        };

        let entries = report.as_object().filter(|entries| !entries.is_empty())?;
        let mut scores: Vec<FileMi> = entries
            .iter()
            .map(|(path, entry)| FileMi {
                path: PathBuf::from(path),
                mi: radon_entry_mi(entry),
            })
            .collect();
        scores.sort_by(|a, b| a.path.cmp(&b.path));
        Some(scores)
    }
}

fn radon_entry_mi(entry: &Value) -> Option<f64> {
    if entry.get("error").is_some() {
        return None;
    }
    entry.get("mi").and_then(Value::as_f64)
}

fn estimate_scores(files: &[PathBuf]) -> Vec<FileMi> {
    let parsed = parsers::parse_files(files);
    let mut scores: Vec<FileMi> = parsed
        .files
        .iter()
        .filter_map(|file| {
            // Whitespace-only files carry no signal
            if file.source.trim().is_empty() {
                return None;
            }
            Some(FileMi {
                path: file.path.clone(),
                mi: Some(estimate_mi(file)),
            })
        })
        .collect();
    scores.extend(parsed.unparseable.into_iter().map(|path| FileMi { path, mi: None }));
    scores.sort_by(|a, b| a.path.cmp(&b.path));
    scores
}

/// Radon-compatible maintainability index estimate for one parsed file.
fn estimate_mi(file: &ParsedFile) -> f64 {
    let volume = halstead_volume(file);
    let complexity: u32 = file.functions().iter().map(|f| f.complexity).sum();

    let mut comment_lines = 0usize;
    file.for_each_node(|node| {
        if node.kind() == "comment" {
            comment_lines += 1;
        }
    });
    let sloc = file
        .source
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .count();
    let loc = file.source.lines().count();

    if volume <= 0.0 || sloc == 0 {
        return 100.0;
    }

    let comment_pct = if loc > 0 {
        comment_lines as f64 / loc as f64 * 100.0
    } else {
        0.0
    };
    let comments_scale = (2.46 * comment_pct.to_radians()).sqrt();
    let mi = 171.0 - 5.2 * volume.ln() - 0.23 * complexity as f64 - 16.2 * (sloc as f64).ln()
        + 50.0 * comments_scale.sin();
    (mi * 100.0 / 171.0).clamp(0.0, 100.0)
}

/// Halstead volume: N × log2(η), treating identifiers and literals as operands
/// and every other leaf token as an operator.
fn halstead_volume(file: &ParsedFile) -> f64 {
    let mut operators = HashSet::new();
    let mut operands = HashSet::new();
    let mut total = 0usize;

    python::for_each_descendant(file.root(), |node| {
        if node.child_count() > 0 && node.kind() != "string" {
            return;
        }
        if node.kind() == "comment" || node.kind() == "string" && is_docstring(node) {
            return;
        }
        // strings are visited as a whole; skip their inner pieces
        if node
            .parent()
            .is_some_and(|p| p.kind() == "string" || p.kind() == "string_content")
        {
            return;
        }
        total += 1;
        let text = file.text(node);
        match node.kind() {
            "identifier" | "integer" | "float" | "string" | "true" | "false" | "none" => {
                operands.insert(text);
            }
            _ => {
                operators.insert(text);
            }
        }
    });

    let vocabulary = operators.len() + operands.len();
    if vocabulary < 2 {
        return 0.0;
    }
    total as f64 * (vocabulary as f64).log2()
}

fn is_docstring(node: tree_sitter::Node<'_>) -> bool {
    node.parent().is_some_and(|p| {
        p.kind() == "expression_statement" && p.named_child_count() == 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(source: &str) -> ParsedFile {
        ParsedFile::parse_source(source.to_string(), Path::new("m.py")).unwrap()
    }

    #[test]
    fn test_estimate_mi_is_bounded() {
        let simple = parsed("def add(a, b):\n    return a + b\n");
        let mi = estimate_mi(&simple);
        assert!(mi > 50.0 && mi <= 100.0, "mi = {mi}");

        let mut tangled = String::from("def tangled(a, b, c):\n    total = 0\n");
        for i in 0..60 {
            tangled.push_str(&format!(
                "    if a > {i} and b < {i} or c == {i}:\n        total += a * {i} - b / (c + {i})\n"
            ));
        }
        tangled.push_str("    return total\n");
        let complex_mi = estimate_mi(&parsed(&tangled));
        assert!(complex_mi >= 0.0);
        assert!(complex_mi < mi);
    }

    #[test]
    fn test_empty_codebase() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = MaintainabilityAssessor::new(&AssessorSettings::default())
            .assess(dir.path())
            .unwrap();
        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.details, vec![NO_PYTHON_FILES]);
    }

    #[test]
    fn test_summary_line_first_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def a(x):\n    return x * 2\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "def b(y):\n    return y + 1\n").unwrap();

        let outcome = MaintainabilityAssessor::new(&AssessorSettings::default())
            .assess(dir.path())
            .unwrap();
        assert!(outcome.details[0].starts_with("Average maintainability index (MI): "));
        assert!(outcome.details[0].ends_with("(size: small)"));
        assert_eq!(outcome.raw_metrics["file_mi_scores"].as_array().unwrap().len(), 2);
        assert!(outcome.score > 0.0 && outcome.score <= 10.0);
    }
}
