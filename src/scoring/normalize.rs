//! Outlier compression across one codebase's score set

use indexmap::IndexMap;

/// Normalization only kicks in when some score exceeds this.
pub const OUTLIER_THRESHOLD: f64 = 15.0;
/// Scores above this are compressed once normalization applies.
pub const NORMALIZE_CEILING: f64 = 10.0;
pub const COMPRESSION_FACTOR: f64 = 0.3;

/// Compress scores above 10 when the set contains an outlier above 15.
///
/// Identity when the set has fewer than two scores or when every score is
/// at most 15. Order and keys are preserved.
pub fn normalize_scores(scores: &IndexMap<String, f64>) -> IndexMap<String, f64> {
    if scores.len() < 2 {
        return scores.clone();
    }

    let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= OUTLIER_THRESHOLD {
        return scores.clone();
    }

    scores
        .iter()
        .map(|(name, &score)| {
            let normalized = if score > NORMALIZE_CEILING {
                NORMALIZE_CEILING + (score - NORMALIZE_CEILING) * COMPRESSION_FACTOR
            } else {
                score
            };
            (name.clone(), normalized)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_identity_when_max_at_threshold() {
        let input = scores(&[("A", 15.0), ("B", 12.0), ("C", 3.0)]);
        assert_eq!(normalize_scores(&input), input);
    }

    #[test]
    fn test_compresses_only_scores_above_ten() {
        let input = scores(&[("A", 20.0), ("B", 12.0), ("C", 4.0), ("D", 10.0)]);
        let out = normalize_scores(&input);
        assert!((out["A"] - 13.0).abs() < 1e-9);
        assert!((out["B"] - 10.6).abs() < 1e-9);
        assert_eq!(out["C"], 4.0);
        assert_eq!(out["D"], 10.0);
    }

    #[test]
    fn test_single_score_is_identity() {
        let input = scores(&[("A", 40.0)]);
        assert_eq!(normalize_scores(&input), input);
        assert!(normalize_scores(&IndexMap::new()).is_empty());
    }

    #[test]
    fn test_preserves_order() {
        let input = scores(&[("Z", 30.0), ("A", 1.0), ("M", 11.0)]);
        let keys: Vec<_> = normalize_scores(&input).keys().cloned().collect();
        assert_eq!(keys, vec!["Z", "A", "M"]);
    }
}
