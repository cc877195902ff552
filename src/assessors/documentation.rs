//! Documentation: docstring coverage and docstring quality
//!
//! Every parsed module, class and function is a documentable entity. A "good"
//! docstring has at least three non-blank lines, no run of more than five
//! blank lines, and mentions both its arguments (`Args:`/`Parameters:`) and
//! `Returns:`. Score = (coverage% / 10 + good_ratio × 10) / 2.

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use crate::models::AssessmentOutcome;
use crate::parsers;
use crate::scoring::clamp_score;
use anyhow::Result;
use std::path::Path;

const MIN_DOCSTRING_LINES: usize = 3;
const MAX_BLANK_RUN: usize = 5;

pub struct DocumentationAssessor;

impl DocumentationAssessor {
    pub fn new(_settings: &AssessorSettings) -> Self {
        Self
    }
}

fn is_good_docstring(docstring: &str) -> bool {
    let non_blank = docstring.lines().filter(|l| !l.trim().is_empty()).count();
    if non_blank < MIN_DOCSTRING_LINES {
        return false;
    }

    let mut blank_run = 0;
    for line in docstring.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > MAX_BLANK_RUN {
                return false;
            }
        } else {
            blank_run = 0;
        }
    }

    let lowered = docstring.to_lowercase();
    let has_args = lowered.contains("args:") || lowered.contains("parameters:");
    has_args && lowered.contains("returns:")
}

#[derive(Default)]
struct Tally {
    total: usize,
    documented: usize,
    good: usize,
}

impl Tally {
    /// Count one entity; returns false when it has no docstring.
    fn record(&mut self, docstring: Option<&str>) -> bool {
        self.total += 1;
        match docstring.filter(|d| !d.trim().is_empty()) {
            Some(doc) => {
                self.documented += 1;
                if is_good_docstring(doc) {
                    self.good += 1;
                }
                true
            }
            None => false,
        }
    }
}

impl Assessor for DocumentationAssessor {
    fn id(&self) -> &'static str {
        "documentation"
    }

    fn description(&self) -> &'static str {
        "Docstring coverage and quality for modules, classes and functions"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        let files = parsers::python_files(codebase);
        if files.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }
        let parsed = parsers::parse_files(&files);

        let mut tally = Tally::default();
        let mut details = Vec::new();
        for file in &parsed.files {
            let path = file.path.display();
            if !tally.record(file.module_docstring().as_deref()) {
                details.push(format!("Missing docstring in module: {}", path));
            }
            let classes = file
                .classes()
                .into_iter()
                .map(|c| (c.name, c.line, c.docstring));
            let functions = file
                .functions()
                .into_iter()
                .map(|f| (f.name, f.line, f.docstring));
            let mut entities: Vec<_> = classes.chain(functions).collect();
            entities.sort_by_key(|(_, line, _)| *line);

            for (name, line, docstring) in entities {
                if !tally.record(docstring.as_deref()) {
                    details.push(format!(
                        "Missing docstring for '{}' in {}:{}",
                        name, path, line
                    ));
                }
            }
        }

        if tally.total == 0 {
            return Ok(AssessmentOutcome::neutral(
                0.0,
                "No documentable entities (classes, functions) found.",
            ));
        }

        let coverage = tally.documented as f64 / tally.total as f64 * 100.0;
        let quality = if tally.documented > 0 {
            tally.good as f64 / tally.documented as f64
        } else {
            0.0
        };
        let score = clamp_score((coverage / 10.0 + quality * 10.0) / 2.0);

        details.insert(
            0,
            format!(
                "Documentation coverage: {:.2}% ({}/{})",
                coverage, tally.documented, tally.total
            ),
        );
        details.insert(
            1,
            format!(
                "Good docstrings: {}/{} ({:.2}%)",
                tally.good,
                tally.documented,
                quality * 100.0
            ),
        );

        Ok(AssessmentOutcome::new(score, details)
            .with_metric("documentable_entities", tally.total)
            .with_metric("documented_entities", tally.documented)
            .with_metric("good_docstrings", tally.good))
    }
}
