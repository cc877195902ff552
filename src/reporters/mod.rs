//! Output reporters for comparison results
//!
//! Supports two output formats:
//! - `text` - Terminal table with colors, summary sentence and optional detail breakdown
//! - `json` - The export document, pretty-printed

mod json;
mod text;

pub use json::write_export;

use crate::engine::ComparisonReport;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a comparison in the given format. `verbose` only affects text output.
pub fn render(report: &ComparisonReport, format: OutputFormat, verbose: bool) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render(report, verbose)),
        OutputFormat::Json => json::render(report),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assessors::Assessor;
    use crate::assessors::AssessorRegistry;
    use crate::config::WeightMap;
    use crate::engine::ComparisonEngine;
    use crate::models::AssessmentOutcome;
    use std::path::Path;
    use std::sync::Arc;

    /// Scores `first` on directories named "alpha", `second` elsewhere, with
    /// `findings` numbered detail lines.
    pub(crate) struct Scripted {
        pub id: &'static str,
        pub first: f64,
        pub second: f64,
        pub findings: usize,
    }

    impl Assessor for Scripted {
        fn id(&self) -> &'static str {
            self.id
        }
        fn description(&self) -> &'static str {
            "scripted"
        }
        fn assess(&self, codebase: &Path) -> anyhow::Result<AssessmentOutcome> {
            let score = if codebase.ends_with("alpha") {
                self.first
            } else {
                self.second
            };
            let details = (1..=self.findings).map(|i| format!("finding {i}")).collect();
            Ok(AssessmentOutcome::new(score, details))
        }
    }

    /// A report comparing `alpha` (Readability 8, Security 4 ±1) with `beta`
    /// (6 and 9), Security weighted 0.5.
    pub(crate) fn test_report() -> (tempfile::TempDir, ComparisonReport) {
        struct WithInterval;
        impl Assessor for WithInterval {
            fn id(&self) -> &'static str {
                "security"
            }
            fn description(&self) -> &'static str {
                "interval"
            }
            fn assess(&self, codebase: &Path) -> anyhow::Result<AssessmentOutcome> {
                Ok(if codebase.ends_with("alpha") {
                    AssessmentOutcome::neutral(4.0, "[Bandit] 3 issues")
                        .with_confidence_interval((3.0, 5.0))
                } else {
                    AssessmentOutcome::new(9.0, vec![])
                })
            }
        }

        let root = tempfile::tempdir().unwrap();
        let alpha = root.path().join("alpha");
        let beta = root.path().join("beta");
        std::fs::create_dir(&alpha).unwrap();
        std::fs::create_dir(&beta).unwrap();

        let mut registry = AssessorRegistry::new();
        registry.register(Arc::new(Scripted {
            id: "readability",
            first: 8.0,
            second: 6.0,
            findings: 7,
        }));
        registry.register(Arc::new(WithInterval));
        let report = ComparisonEngine::new(registry)
            .with_weights(WeightMap::parse(r#"{"Security": 0.5}"#).unwrap())
            .compare(&alpha, &beta)
            .unwrap();
        (root, report)
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("terminal".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "text");
    }
}
