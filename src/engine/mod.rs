//! Comparison engine
//!
//! Runs every registered, non-skipped assessor over two codebases and turns
//! the outcomes into weighted totals and a winner.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   ComparisonEngine                      │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Validate both inputs are directories                │
//! │  2. For each assessor (registry order, skips removed):  │
//! │       assess(first), assess(second)                     │
//! │       errors / panics / NaN → 0.0 + failure detail      │
//! │  3. Normalize each side's raw scores                    │
//! │  4. Apply weights, sum totals, decide row winners       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Assessors run sequentially. A failing assessor never aborts the comparison:
//! its row shows 0.0 and a detail naming the failure.

use crate::assessors::{AssessorRegistry, RegisteredAssessor};
use crate::config::{SkipList, WeightMap};
use crate::error::{BenchError, BenchResult};
use crate::models::{AssessmentOutcome, RawMetrics, Winner};
use crate::scoring::normalize_scores;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Progress callback: (assessor name, completed runs, total runs)
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Orchestrates one two-codebase comparison.
pub struct ComparisonEngine {
    registry: AssessorRegistry,
    weights: WeightMap,
    skip: SkipList,
    progress_callback: Option<ProgressCallback>,
}

impl ComparisonEngine {
    pub fn new(registry: AssessorRegistry) -> Self {
        Self {
            registry,
            weights: WeightMap::default(),
            skip: SkipList::default(),
            progress_callback: None,
        }
    }

    pub fn with_weights(mut self, weights: WeightMap) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_skip(mut self, skip: SkipList) -> Self {
        self.skip = skip;
        self
    }

    /// Set a progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Assessors that will run, in registry order.
    pub fn active_assessors(&self) -> Vec<&RegisteredAssessor> {
        self.registry
            .iter()
            .filter(|entry| !self.skip.contains(&entry.name))
            .collect()
    }

    /// Compare two codebases.
    ///
    /// Fails only with `InvalidInput`, before any assessor runs.
    pub fn compare(&self, first: &Path, second: &Path) -> BenchResult<ComparisonReport> {
        let roots = [resolve_codebase(first)?, resolve_codebase(second)?];
        self.log_unknown_names();

        let active = self.active_assessors();
        let total_runs = active.len() * 2;
        info!(
            "Comparing {} vs {} across {} assessors",
            first.display(),
            second.display(),
            active.len()
        );

        let mut outcomes1 = IndexMap::new();
        let mut outcomes2 = IndexMap::new();
        let mut completed = 0;
        for entry in active {
            for (root, outcomes) in roots.iter().zip([&mut outcomes1, &mut outcomes2]) {
                let outcome = run_assessor(entry, root);
                outcomes.insert(entry.name.clone(), outcome);
                completed += 1;
                if let Some(ref callback) = self.progress_callback {
                    callback(&entry.name, completed, total_runs);
                }
            }
        }

        let first = CodebaseResults::new(first, outcomes1);
        let second = CodebaseResults::new(second, outcomes2);
        Ok(ComparisonReport::build(first, second, self.weights.clone()))
    }

    fn log_unknown_names(&self) {
        for name in self.weights.unknown_names(|n| self.registry.contains(n)) {
            debug!(
                "Weight for '{}' has no effect: {}",
                name,
                BenchError::NotFound(name.to_string())
            );
        }
        for name in self.skip.names() {
            if !self.registry.contains(name) {
                debug!("Skipping '{}' is a no-op: not registered", name);
            }
        }
    }
}

/// Absolute form of a codebase directory. Assessors change their working
/// directory when running tools, so relative roots would not survive.
fn resolve_codebase(path: &Path) -> BenchResult<PathBuf> {
    if !path.is_dir() {
        return Err(BenchError::InvalidInput(format!(
            "'{}' is not a directory",
            path.display()
        )));
    }
    std::fs::canonicalize(path).map_err(|e| {
        BenchError::InvalidInput(format!("Cannot resolve '{}': {}", path.display(), e))
    })
}

/// Run one assessor, containing errors, panics and non-finite scores.
fn run_assessor(entry: &RegisteredAssessor, path: &Path) -> AssessmentOutcome {
    let name = entry.name.as_str();
    let start = Instant::now();
    let result =
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| entry.assessor.assess(path)));
    let elapsed = start.elapsed().as_millis();

    let reason = match result {
        Ok(Ok(mut outcome)) => {
            if outcome.score.is_finite() {
                let (low, high) = outcome.confidence_interval;
                if !(low.is_finite() && high.is_finite()) {
                    debug!("{} returned a non-finite interval; dropping it", name);
                    outcome.confidence_interval = (outcome.score, outcome.score);
                }
                debug!(
                    "{} scored {:.2} on {} in {}ms",
                    name,
                    outcome.score,
                    path.display(),
                    elapsed
                );
                return outcome;
            }
            format!("returned a non-finite score ({})", outcome.score)
        }
        Ok(Err(e)) => format!("{:#}", e),
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            format!("panicked: {}", panic_msg)
        }
    };

    let failure = BenchError::AssessorFailure {
        assessor: name.to_string(),
        reason: reason.clone(),
    };
    error!("{} (on {})", failure, path.display());
    AssessmentOutcome::failure(name, reason)
}

/// Everything measured for one codebase.
#[derive(Debug, Clone)]
pub struct CodebaseResults {
    pub path: PathBuf,
    /// Outcomes keyed by display name, in run order
    pub outcomes: IndexMap<String, AssessmentOutcome>,
    pub normalized_scores: IndexMap<String, f64>,
    /// Sum of normalized score × weight
    pub total: f64,
}

impl CodebaseResults {
    fn new(path: &Path, outcomes: IndexMap<String, AssessmentOutcome>) -> Self {
        let raw: IndexMap<String, f64> = outcomes
            .iter()
            .map(|(name, outcome)| (name.clone(), outcome.score))
            .collect();
        Self {
            path: path.to_path_buf(),
            outcomes,
            normalized_scores: normalize_scores(&raw),
            total: 0.0,
        }
    }

    /// Last path component, for display
    pub fn label(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn raw_scores(&self) -> IndexMap<String, f64> {
        self.outcomes
            .iter()
            .map(|(name, o)| (name.clone(), o.score))
            .collect()
    }

    pub fn details(&self) -> IndexMap<String, Vec<String>> {
        self.outcomes
            .iter()
            .map(|(name, o)| (name.clone(), o.details.clone()))
            .collect()
    }

    pub fn raw_metrics(&self) -> IndexMap<String, RawMetrics> {
        self.outcomes
            .iter()
            .map(|(name, o)| (name.clone(), o.raw_metrics.clone()))
            .collect()
    }

    pub fn confidence_intervals(&self) -> IndexMap<String, (f64, f64)> {
        self.outcomes
            .iter()
            .map(|(name, o)| (name.clone(), o.confidence_interval))
            .collect()
    }

    /// Every assessor scored exactly zero (and at least one ran).
    pub fn appears_empty(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.values().all(|o| o.score == 0.0)
    }
}

/// One assessor's line in the comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub name: String,
    pub weight: f64,
    pub weighted1: f64,
    pub weighted2: f64,
    pub winner: Winner,
}

/// Result of one comparison.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub first: CodebaseResults,
    pub second: CodebaseResults,
    pub rows: Vec<ComparisonRow>,
    pub weights: WeightMap,
    pub winner: Winner,
}

impl ComparisonReport {
    fn build(mut first: CodebaseResults, mut second: CodebaseResults, weights: WeightMap) -> Self {
        let mut rows = Vec::with_capacity(first.outcomes.len());
        for name in first.outcomes.keys() {
            let weight = weights.weight_for(name);
            let weighted1 = first.normalized_scores.get(name).copied().unwrap_or(0.0) * weight;
            let weighted2 = second.normalized_scores.get(name).copied().unwrap_or(0.0) * weight;
            rows.push(ComparisonRow {
                name: name.clone(),
                weight,
                weighted1,
                weighted2,
                winner: Winner::decide(weighted1, weighted2),
            });
        }

        first.total = rows.iter().map(|r| r.weighted1).sum();
        second.total = rows.iter().map(|r| r.weighted2).sum();

        for side in [&first, &second] {
            if side.appears_empty() {
                warn!(
                    "{} appears to be empty or has no analyzable code",
                    side.path.display()
                );
            }
        }

        let winner = Winner::decide(first.total, second.total);
        info!(
            "Totals: {:.2} vs {:.2} ({:?})",
            first.total, second.total, winner
        );
        Self {
            first,
            second,
            rows,
            weights,
            winner,
        }
    }

    pub fn total_gap(&self) -> f64 {
        (self.first.total - self.second.total).abs()
    }

    /// How far apart the totals are, as a comparative phrase.
    pub fn assessment_phrase(&self) -> &'static str {
        match self.total_gap() {
            gap if gap > 10.0 => "significantly better",
            gap if gap > 5.0 => "moderately better",
            gap if gap > 2.0 => "slightly better",
            _ => "very similar to",
        }
    }

    /// Result bundle stored with each recorded run.
    pub fn results_bundle(&self) -> Value {
        json!({
            "details1": self.first.details(),
            "details2": self.second.details(),
            "raw_metrics1": self.first.raw_metrics(),
            "raw_metrics2": self.second.raw_metrics(),
            "raw_scores1": self.first.raw_scores(),
            "raw_scores2": self.second.raw_scores(),
            "normalized_scores1": self.first.normalized_scores,
            "normalized_scores2": self.second.normalized_scores,
        })
    }

    /// Export document: totals and inputs plus the full result bundle.
    pub fn export_document(&self) -> Value {
        let mut doc = json!({
            "codebase1": self.first.path.display().to_string(),
            "codebase2": self.second.path.display().to_string(),
            "total_score1": self.first.total,
            "total_score2": self.second.total,
        });
        if let (Value::Object(doc), Value::Object(bundle)) = (&mut doc, self.results_bundle()) {
            doc.extend(bundle);
            doc.insert(
                "confidence_intervals1".into(),
                json!(self.first.confidence_intervals()),
            );
            doc.insert(
                "confidence_intervals2".into(),
                json!(self.second.confidence_intervals()),
            );
            doc.insert("weights".into(), json!(self.weights.entries()));
            doc.insert("winner".into(), json!(self.winner));
        }
        doc
    }
}
