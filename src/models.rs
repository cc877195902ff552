//! Core data models for repobench
//!
//! These models flow between assessors, the comparison engine,
//! the reporters and the run history store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Structured, assessor-specific metrics (insertion ordered).
pub type RawMetrics = serde_json::Map<String, Value>;

/// Result of one assessor run against one codebase.
///
/// `details` is order-significant: summary lines come first, individual
/// findings after. A failed or degraded run always carries at least one
/// detail explaining why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub score: f64,
    pub details: Vec<String>,
    #[serde(default)]
    pub raw_metrics: RawMetrics,
    pub confidence_interval: (f64, f64),
}

impl AssessmentOutcome {
    /// Outcome with a zero-width interval at `score`.
    pub fn new(score: f64, details: Vec<String>) -> Self {
        Self {
            score,
            details,
            raw_metrics: RawMetrics::new(),
            confidence_interval: (score, score),
        }
    }

    /// Single-line outcome, used for "nothing to analyze" and tool-unavailable cases.
    pub fn neutral(score: f64, detail: impl Into<String>) -> Self {
        Self::new(score, vec![detail.into()])
    }

    /// Zero score with a synthetic detail naming the failure.
    pub fn failure(assessor: &str, reason: impl fmt::Display) -> Self {
        Self::new(0.0, vec![format!("{assessor} assessment failed: {reason}")])
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.raw_metrics.insert(key.into(), value.into());
        self
    }

    pub fn with_metrics(mut self, metrics: RawMetrics) -> Self {
        self.raw_metrics.extend(metrics);
        self
    }

    pub fn with_confidence_interval(mut self, interval: (f64, f64)) -> Self {
        self.confidence_interval = interval;
        self
    }

    /// True when the interval carries information (non zero-width).
    pub fn has_interval(&self) -> bool {
        self.confidence_interval.0 != self.confidence_interval.1
    }

    /// Render the score, with a `±half-width` suffix when an interval is known.
    pub fn format_score_with_ci(&self) -> String {
        if !self.has_interval() {
            return format!("{:.2}", self.score);
        }
        let range = self.confidence_interval.1 - self.confidence_interval.0;
        format!("{:.2} ±{:.1}", self.score, range / 2.0)
    }
}

/// Codebase size classification by total non-blank Python lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    pub fn from_line_count(lines: usize) -> Self {
        if lines < 100 {
            SizeBucket::Small
        } else if lines < 1000 {
            SizeBucket::Medium
        } else {
            SizeBucket::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeBucket::Small => "small",
            SizeBucket::Medium => "medium",
            SizeBucket::Large => "large",
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side won a row or the whole comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    First,
    Second,
    Tie,
}

impl Winner {
    /// Strictly-greater wins; equal values tie.
    pub fn decide(first: f64, second: f64) -> Self {
        if first > second {
            Winner::First
        } else if second > first {
            Winner::Second
        } else {
            Winner::Tie
        }
    }
}

/// One persisted comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub id: u64,
    /// ISO-8601, UTC
    pub timestamp: String,
    pub codebase1: String,
    pub codebase2: String,
    pub total1: f64,
    pub total2: f64,
    /// The full results bundle, serialized JSON text
    pub details_json: String,
}

impl BenchmarkRun {
    pub fn winner(&self) -> Winner {
        Winner::decide(self.total1, self.total2)
    }

    /// Parse `details_json` back into a JSON value.
    pub fn details(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.details_json)
    }
}
