//! Weight map and skip list parsing
//!
//! Both are keyed by assessor display name and matched case-insensitively, so
//! `{"githealth": 2}` and `--skip git_health` refer to `GitHealth`.

use crate::assessors::match_key;
use crate::error::{BenchError, BenchResult};
use indexmap::IndexMap;
use serde_json::Value;

/// Weight applied to assessors the map does not mention
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Per-assessor multipliers applied to normalized scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightMap {
    /// Keys as the user wrote them, in input order
    weights: IndexMap<String, f64>,
}

impl WeightMap {
    /// Parse a JSON object of non-negative numbers, e.g. `{"Readability": 1.2}`.
    pub fn parse(json: &str) -> BenchResult<Self> {
        let json = json.trim();
        if json.is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(json)
            .map_err(|e| BenchError::InvalidInput(format!("Invalid JSON for weights: {}", e)))?;
        let Value::Object(entries) = value else {
            return Err(BenchError::InvalidInput(
                "Weights must be a JSON object mapping assessor names to numbers".to_string(),
            ));
        };

        let mut weights = IndexMap::new();
        for (name, raw) in entries {
            let weight = raw.as_f64().ok_or_else(|| {
                BenchError::InvalidInput(format!("Weight for '{}' is not a number: {}", name, raw))
            })?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(BenchError::InvalidInput(format!(
                    "Weight for '{}' must be a finite number >= 0, got {}",
                    name, weight
                )));
            }
            weights.insert(name, weight);
        }
        Ok(Self { weights })
    }

    pub fn from_pairs<I, S>(pairs: I) -> BenchResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut weights = IndexMap::new();
        for (name, weight) in pairs {
            let name = name.into();
            if !weight.is_finite() || weight < 0.0 {
                return Err(BenchError::InvalidInput(format!(
                    "Weight for '{}' must be a finite number >= 0, got {}",
                    name, weight
                )));
            }
            weights.insert(name, weight);
        }
        Ok(Self { weights })
    }

    /// Weight for an assessor display name; 1.0 when unmentioned.
    pub fn weight_for(&self, name: &str) -> f64 {
        let key = match_key(name);
        self.weights
            .iter()
            .rev() // a later duplicate wins
            .find(|(k, _)| match_key(k) == key)
            .map(|(_, w)| *w)
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Names in the map that `is_known` rejects
    pub fn unknown_names<'a>(&'a self, is_known: impl Fn(&str) -> bool) -> Vec<&'a str> {
        self.weights
            .keys()
            .map(String::as_str)
            .filter(|name| !is_known(name))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weights as given, for export
    pub fn entries(&self) -> &IndexMap<String, f64> {
        &self.weights
    }
}

/// Assessors to leave out of a comparison entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipList {
    names: Vec<String>,
}

impl SkipList {
    /// Parse a comma-separated list; blanks and surrounding whitespace are ignored.
    pub fn parse(list: &str) -> Self {
        Self {
            names: list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = match_key(name);
        self.names.iter().any(|n| match_key(n) == key)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
