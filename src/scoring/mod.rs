//! Score post-processing shared by assessors and the comparison engine
//!
//! Raw assessor scores live on a nominal 0-10 scale but are not hard-clamped,
//! and some formulas are known to be biased by codebase size. This module
//! holds the pure functions that put scores from different assessors on a
//! comparable footing.
//!
//! # Pipeline
//!
//! ```text
//! assessor:   raw  ──► adjust_for_size(raw, bucket, kind)  ──► outcome.score
//!                      (min(10, raw × multiplier))
//! engine:     {name: outcome.score} ──► normalize_scores ──► × weight ──► Σ total
//!                      (compress > 10 only when max > 15)
//! ```
//!
//! # Bias multipliers
//!
//! | kind            | small | medium | large |
//! |-----------------|-------|--------|-------|
//! | maintainability | 1.5   | 1.0    | 0.9   |
//! | readability     | 1.2   | 1.0    | 0.95  |
//! | other           | 1.1   | 1.0    | 1.0   |
//!
//! Confidence intervals use a two-sided Student's t interval around the
//! sample mean; fewer than two samples yield the `(0.0, 0.0)` sentinel.

mod confidence;
mod normalize;
mod size;

pub use confidence::{confidence_interval, student_t_quantile, DEFAULT_CONFIDENCE};
pub use normalize::{normalize_scores, COMPRESSION_FACTOR, NORMALIZE_CEILING, OUTLIER_THRESHOLD};
pub use size::{adjust_for_size, classify_codebase, size_multiplier, MetricKind};

/// Clamp a score into the nominal 0-10 range.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 10.0)
}
