//! Size-bucket classification and size-bias adjustment

use crate::models::SizeBucket;
use crate::parsers;
use std::path::Path;
use tracing::debug;

/// Which row of the bias table a metric uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Maintainability,
    Readability,
    /// Every metric without a dedicated row
    Other,
}

pub fn size_multiplier(kind: MetricKind, bucket: SizeBucket) -> f64 {
    match (kind, bucket) {
        (MetricKind::Maintainability, SizeBucket::Small) => 1.5,
        (MetricKind::Maintainability, SizeBucket::Medium) => 1.0,
        (MetricKind::Maintainability, SizeBucket::Large) => 0.9,
        (MetricKind::Readability, SizeBucket::Small) => 1.2,
        (MetricKind::Readability, SizeBucket::Medium) => 1.0,
        (MetricKind::Readability, SizeBucket::Large) => 0.95,
        (MetricKind::Other, SizeBucket::Small) => 1.1,
        (MetricKind::Other, _) => 1.0,
    }
}

/// `min(10, raw × multiplier)`. Never raises a score past 10.
pub fn adjust_for_size(raw_score: f64, bucket: SizeBucket, kind: MetricKind) -> f64 {
    (raw_score * size_multiplier(kind, bucket)).min(10.0)
}

/// Classify a codebase by the non-blank lines of its Python files.
///
/// Recomputed on every call; unreadable files are skipped.
pub fn classify_codebase(root: &Path) -> SizeBucket {
    let total: usize = parsers::python_files(root)
        .iter()
        .filter_map(|path| parsers::count_non_blank_lines(path).ok())
        .sum();
    let bucket = SizeBucket::from_line_count(total);
    debug!("{} has {} non-blank lines ({})", root.display(), total, bucket);
    bucket
}
