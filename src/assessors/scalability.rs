//! Scalability: concurrency primitives and caching libraries in use

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use crate::models::AssessmentOutcome;
use crate::parsers;
use crate::scoring::clamp_score;
use anyhow::Result;
use std::path::Path;

const CACHING_KEYWORDS: [&str; 5] = ["redis", "memcached", "celery", "cache", "cachetools"];

pub struct ScalabilityAssessor;

impl ScalabilityAssessor {
    pub fn new(_settings: &AssessorSettings) -> Self {
        Self
    }
}

impl Assessor for ScalabilityAssessor {
    fn id(&self) -> &'static str {
        "scalability"
    }

    fn description(&self) -> &'static str {
        "Async I/O, multiprocessing and caching usage"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        let files = parsers::python_files(codebase);
        if files.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }
        let parsed = parsers::parse_files(&files);

        let imports: Vec<String> = parsed
            .files
            .iter()
            .flat_map(|file| file.imports())
            .collect();
        let (total_functions, async_functions) =
            parsed.files.iter().fold((0usize, 0usize), |(total, asyncs), file| {
                let functions = file.functions();
                let n_async = functions.iter().filter(|f| f.is_async).count();
                (total + functions.len(), asyncs + n_async)
            });

        let uses_asyncio = imports.iter().any(|m| m.contains("asyncio") || m.contains("async"));
        let uses_multiprocessing = imports.iter().any(|m| m.contains("multiprocessing"));
        let uses_caching = imports
            .iter()
            .any(|m| CACHING_KEYWORDS.iter().any(|kw| m.contains(kw)));

        let mut score = 0.0;
        let mut details = Vec::new();
        if uses_asyncio {
            score += 3.0;
            details.push("Uses 'asyncio' for I/O-bound concurrency.".to_string());
        }
        if uses_multiprocessing {
            score += 3.0;
            details.push("Uses 'multiprocessing' for CPU-bound parallelism.".to_string());
        }
        if uses_caching {
            score += 2.0;
            details.push(
                "Appears to use a caching or task queue library (e.g., Redis, Celery)."
                    .to_string(),
            );
        }

        let async_ratio = if total_functions > 0 {
            async_functions as f64 / total_functions as f64
        } else {
            0.0
        };
        score += async_ratio * 2.0;
        if async_ratio > 0.0 {
            details.push(format!("{:.1}% of functions are async.", async_ratio * 100.0));
        }
        if details.is_empty() {
            details.push("No concurrency or caching features detected.".to_string());
        }

        Ok(AssessmentOutcome::new(clamp_score(score), details)
            .with_metric("uses_asyncio", uses_asyncio)
            .with_metric("uses_multiprocessing", uses_multiprocessing)
            .with_metric("uses_caching", uses_caching)
            .with_metric("async_ratio", async_ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_concurrency_and_caching() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("svc.py"),
            "import asyncio\nfrom multiprocessing import Pool\nimport redis\n\nasync def fetch():\n    pass\n\ndef compute():\n    pass\n",
        )
        .unwrap();
        let outcome = ScalabilityAssessor.assess(dir.path()).unwrap();
        assert_eq!(outcome.score, 9.0);
        assert_eq!(outcome.details.len(), 4);
        assert_eq!(outcome.details[3], "50.0% of functions are async.");
    }

    #[test]
    fn test_plain_code_scores_zero() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "import os\n\ndef f():\n    pass\n").unwrap();
        let outcome = ScalabilityAssessor.assess(dir.path()).unwrap();
        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.details, vec!["No concurrency or caching features detected."]);
    }
}
