//! Performance: static anti-patterns plus optional runtime profiling
//!
//! Static deductions: `list.insert(0, x)` costs 1.0, `name += ...` inside a loop
//! costs 0.5 per enclosing loop, and a `for` nested in a `for` costs 0.3. When a
//! profile script is configured it is run under pyinstrument (wall time) and
//! memory_profiler (peak memory) several times, and the final score becomes
//! 0.4 × static + 0.6 × dynamic.

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use super::external_tool::{python_tool_command, read_json_report, run_external_tool};
use crate::models::AssessmentOutcome;
use crate::parsers::{self, python, ParsedFile};
use crate::scoring::{
    adjust_for_size, clamp_score, classify_codebase, confidence_interval, MetricKind,
    DEFAULT_CONFIDENCE,
};
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

const INSERT_ZERO_COST: f64 = 1.0;
const LOOP_CONCAT_COST: f64 = 0.5;
const NESTED_LOOP_COST: f64 = 0.3;

/// Neutral memory score when no peak could be measured
const UNMEASURED_MEMORY_SCORE: f64 = 8.0;

fn peak_memory_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"maximum\s+of\s+([0-9]+(?:\.[0-9]+)?)").expect("valid regex")
    })
}

pub struct PerformanceAssessor {
    python: String,
    timeout_secs: u64,
    profile_script: Option<PathBuf>,
    runs: usize,
}

impl PerformanceAssessor {
    pub fn new(settings: &AssessorSettings) -> Self {
        Self {
            python: settings.python.clone(),
            timeout_secs: settings.tool_timeout_secs,
            profile_script: settings.profile_script.clone(),
            runs: settings.profile_runs.max(1),
        }
    }
}

impl Assessor for PerformanceAssessor {
    fn id(&self) -> &'static str {
        "performance"
    }

    fn description(&self) -> &'static str {
        "Static performance anti-patterns and optional runtime profiling"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        let files = parsers::python_files(codebase);
        if files.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }

        let parsed = parsers::parse_files(&files);
        let (static_score, mut details) = static_performance(&parsed.files);

        let mut outcome_metrics = serde_json::Map::new();
        outcome_metrics.insert("static_score".into(), static_score.into());

        let mut samples = vec![static_score];
        let script = self
            .profile_script
            .as_deref()
            .and_then(|p| std::fs::canonicalize(p).ok());
        let final_score = match script {
            Some(script) => {
                let profile = self.profile(codebase, &script)?;
                details.extend(profile.details.iter().cloned());
                outcome_metrics.extend(profile.metrics());
                samples = profile.run_scores(static_score);
                0.4 * static_score + 0.6 * profile.dynamic_score()
            }
            None => {
                details.push(
                    "No profile script provided (set BENCH_PROFILE_SCRIPT or --profile). Using static analysis only."
                        .to_string(),
                );
                static_score
            }
        };

        let bucket = classify_codebase(codebase);
        let adjusted = adjust_for_size(final_score, bucket, MetricKind::Other);

        Ok(AssessmentOutcome::new(adjusted, details)
            .with_metrics(outcome_metrics)
            .with_metric("size_bucket", bucket.as_str())
            .with_metric("unadjusted_score", final_score)
            .with_confidence_interval(confidence_interval(&samples, DEFAULT_CONFIDENCE)))
    }
}

/// Anti-pattern scan. Returns the clamped static score and its details,
/// summary line first.
fn static_performance(files: &[ParsedFile]) -> (f64, Vec<String>) {
    let mut details = Vec::new();
    let mut penalty = 0.0;

    for file in files {
        file.for_each_node(|node| {
            match node.kind() {
                "call" if is_insert_at_front(file, node) => {
                    details.push(format!(
                        "Inefficient 'list.insert(0, ...)' at {}",
                        file.location(node)
                    ));
                    penalty += INSERT_ZERO_COST;
                }
                "for_statement" | "while_statement" => {
                    let is_for = node.kind() == "for_statement";
                    python::for_each_descendant(node, |inner| {
                        if inner.id() == node.id() {
                            return;
                        }
                        if inner.kind() == "augmented_assignment" && is_name_plus_assign(file, inner)
                        {
                            details.push(format!(
                                "String concatenation in loop at {}",
                                file.location(node)
                            ));
                            penalty += LOOP_CONCAT_COST;
                        }
                        if is_for && inner.kind() == "for_statement" {
                            details.push(format!(
                                "Nested loops (O(n²) risk) at {}",
                                file.location(node)
                            ));
                            penalty += NESTED_LOOP_COST;
                        }
                    });
                }
                _ => {}
            }
        });
    }

    details.insert(
        0,
        format!("Static analysis: {:.1} performance anti-patterns found", penalty),
    );
    (clamp_score(10.0 - penalty), details)
}

fn is_insert_at_front(file: &ParsedFile, call: tree_sitter::Node<'_>) -> bool {
    let Some(function) = call.child_by_field_name("function") else {
        return false;
    };
    if function.kind() != "attribute" {
        return false;
    }
    let is_insert = function
        .child_by_field_name("attribute")
        .is_some_and(|attr| file.text(attr) == "insert");
    if !is_insert {
        return false;
    }
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return false;
    };
    let mut cursor = arguments.walk();
    let args: Vec<_> = arguments
        .named_children(&mut cursor)
        .filter(|a| a.kind() != "comment")
        .collect();
    args.len() == 2 && args[0].kind() == "integer" && file.text(args[0]) == "0"
}

fn is_name_plus_assign(file: &ParsedFile, node: tree_sitter::Node<'_>) -> bool {
    let plus = node
        .child_by_field_name("operator")
        .is_some_and(|op| file.text(op) == "+=");
    let target_is_name = node
        .child_by_field_name("left")
        .is_some_and(|left| left.kind() == "identifier");
    plus && target_is_name
}

/// Measurements from repeated profiling runs.
#[derive(Default)]
struct ProfileRuns {
    /// Wall time per run, ms (runs that failed are absent)
    execution_times: Vec<f64>,
    /// Peak memory per run, MiB
    memory_peaks: Vec<f64>,
    details: Vec<String>,
}

impl ProfileRuns {
    fn time_score(&self) -> f64 {
        if self.execution_times.is_empty() {
            return 0.0;
        }
        time_score(mean(&self.execution_times))
    }

    fn memory_score(&self) -> f64 {
        if self.memory_peaks.is_empty() {
            return UNMEASURED_MEMORY_SCORE;
        }
        memory_score(mean(&self.memory_peaks))
    }

    fn dynamic_score(&self) -> f64 {
        (self.time_score() + self.memory_score()) / 2.0
    }

    /// Per-run combined scores, for the confidence interval.
    fn run_scores(&self, static_score: f64) -> Vec<f64> {
        let memory = self.memory_score();
        if self.execution_times.is_empty() {
            return vec![0.4 * static_score + 0.6 * self.dynamic_score()];
        }
        self.execution_times
            .iter()
            .map(|&ms| 0.4 * static_score + 0.6 * (time_score(ms) + memory) / 2.0)
            .collect()
    }

    fn metrics(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut metrics = serde_json::Map::new();
        if !self.execution_times.is_empty() {
            metrics.insert("execution_times".into(), self.execution_times.clone().into());
            metrics.insert(
                "avg_execution_time_ms".into(),
                mean(&self.execution_times).into(),
            );
        }
        if !self.memory_peaks.is_empty() {
            metrics.insert("memory_peaks_mb".into(), self.memory_peaks.clone().into());
            metrics.insert("avg_memory_mb".into(), mean(&self.memory_peaks).into());
        }
        metrics.insert("dynamic_score".into(), self.dynamic_score().into());
        metrics
    }
}

impl PerformanceAssessor {
    fn profile(&self, codebase: &Path, script: &Path) -> Result<ProfileRuns> {
        let scratch = tempfile::tempdir().context("Failed to create profiling scratch dir")?;
        let script_arg = script.display().to_string();
        let mut runs = ProfileRuns::default();
        let mut errors: Vec<String> = Vec::new();

        for run in 0..self.runs {
            let report = scratch.path().join(format!("time_{run}.json"));
            let mut cmd = python_tool_command(&self.python, "pyinstrument", "pyinstrument");
            cmd.extend([
                "-r".to_string(),
                "json".to_string(),
                "-o".to_string(),
                report.display().to_string(),
                script_arg.clone(),
            ]);
            match run_external_tool(&cmd, "pyinstrument", self.timeout_secs, Some(codebase), None)
                .and_then(|out| {
                    debug!("pyinstrument run {} exited with {:?}", run, out.return_code);
                    read_json_report("pyinstrument", &report)
                }) {
                Ok(report) => {
                    if let Some(seconds) = report.get("duration").and_then(|d| d.as_f64()) {
                        runs.execution_times.push(seconds * 1000.0);
                    }
                }
                Err(e) => push_unique(&mut errors, format!("Error in time profiling: {e}")),
            }

            let cmd = vec![
                self.python.clone(),
                "-m".to_string(),
                "memory_profiler".to_string(),
                script_arg.clone(),
            ];
            match run_external_tool(&cmd, "memory_profiler", self.timeout_secs, Some(codebase), None)
            {
                Ok(out) if out.succeeded() => {
                    if let Some(peak) = parse_peak_memory(&out.stdout) {
                        runs.memory_peaks.push(peak);
                    }
                }
                Ok(out) => debug!("memory_profiler exited with {:?}", out.return_code),
                Err(e) => push_unique(&mut errors, format!("Error in memory profiling: {e}")),
            }
        }
        // scratch is removed here, on every path out of this function
        drop(scratch);

        runs.details.extend(errors);
        if runs.execution_times.is_empty() {
            runs.details.push("Could not measure execution time".to_string());
        } else {
            runs.details.push(format!(
                "Avg execution time: {:.1}ms (±{:.1}ms)",
                mean(&runs.execution_times),
                std_dev(&runs.execution_times)
            ));
        }
        if runs.memory_peaks.is_empty() {
            runs.details.push("Could not measure memory usage".to_string());
        } else {
            runs.details
                .push(format!("Peak memory usage: {:.1}MB", mean(&runs.memory_peaks)));
        }
        Ok(runs)
    }
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

fn parse_peak_memory(stdout: &str) -> Option<f64> {
    let regex = peak_memory_regex();
    stdout
        .lines()
        .filter(|line| line.contains("MiB"))
        .find_map(|line| regex.captures(line))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn time_score(avg_ms: f64) -> f64 {
    match avg_ms {
        t if t < 100.0 => 10.0,
        t if t < 500.0 => 8.0,
        t if t < 1000.0 => 6.0,
        t if t < 2000.0 => 4.0,
        _ => 2.0,
    }
}

fn memory_score(avg_mb: f64) -> f64 {
    match avg_mb {
        m if m < 50.0 => 10.0,
        m if m < 200.0 => 8.0,
        m if m < 500.0 => 6.0,
        _ => 4.0,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; zero for fewer than two values
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
