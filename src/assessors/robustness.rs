//! Robustness: specificity of exception handlers and use of `logging`

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use crate::models::AssessmentOutcome;
use crate::parsers::{self, ParsedFile};
use crate::scoring::clamp_score;
use anyhow::Result;
use std::path::Path;
use tree_sitter::Node;

pub struct RobustnessAssessor;

impl RobustnessAssessor {
    pub fn new(_settings: &AssessorSettings) -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    Bare,
    Generic,
    Specific,
}

fn classify_handler(file: &ParsedFile, clause: Node<'_>) -> HandlerKind {
    let mut cursor = clause.walk();
    let caught = clause
        .named_children(&mut cursor)
        .find(|child| child.kind() != "block" && child.kind() != "comment");
    let Some(mut caught) = caught else {
        return HandlerKind::Bare;
    };
    // `except Exception as e`
    if caught.kind() == "as_pattern" {
        match caught.named_child(0) {
            Some(inner) => caught = inner,
            None => return HandlerKind::Specific,
        }
    }
    if caught.kind() == "identifier" && file.text(caught) == "Exception" {
        HandlerKind::Generic
    } else {
        HandlerKind::Specific
    }
}

fn uses_logging(files: &[ParsedFile]) -> bool {
    files.iter().any(|file| {
        file.imports()
            .iter()
            .any(|module| module == "logging" || module.starts_with("logging."))
    })
}

impl Assessor for RobustnessAssessor {
    fn id(&self) -> &'static str {
        "robustness"
    }

    fn description(&self) -> &'static str {
        "Exception handler specificity and logging usage"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        let files = parsers::python_files(codebase);
        if files.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }
        let parsed = parsers::parse_files(&files);

        let mut findings = Vec::new();
        let mut total = 0usize;
        let mut specific = 0usize;
        for file in &parsed.files {
            file.for_each_node(|node| {
                if node.kind() != "except_clause" {
                    return;
                }
                total += 1;
                match classify_handler(file, node) {
                    HandlerKind::Specific => specific += 1,
                    HandlerKind::Generic => findings.push(format!(
                        "Generic 'except Exception' used in {}",
                        file.location(node)
                    )),
                    HandlerKind::Bare => {
                        findings.push(format!("Bare 'except:' used in {}", file.location(node)))
                    }
                }
            });
        }

        let logging = uses_logging(&parsed.files);
        let mut details = vec![if logging {
            "Codebase appears to use the 'logging' module.".to_string()
        } else {
            "Codebase does not appear to use the 'logging' module.".to_string()
        }];
        let logging_bonus = if logging { 2.0 } else { 0.0 };

        if total == 0 {
            let score = if logging { 5.0 } else { 2.0 };
            return Ok(AssessmentOutcome::new(score, details)
                .with_metric("handlers", 0)
                .with_metric("uses_logging", logging));
        }

        let quality = specific as f64 / total as f64;
        details.push(format!(
            "Error handling quality: {:.2}% ({}/{} specific handlers)",
            quality * 100.0,
            specific,
            total
        ));
        details.extend(findings);

        Ok(
            AssessmentOutcome::new(clamp_score(quality * 8.0 + logging_bonus), details)
                .with_metric("handlers", total)
                .with_metric("specific_handlers", specific)
                .with_metric("uses_logging", logging),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(files: &[(&str, &str)]) -> AssessmentOutcome {
        let dir = tempfile::tempdir().unwrap();
        for (name, source) in files {
            std::fs::write(dir.path().join(name), source).unwrap();
        }
        RobustnessAssessor.assess(dir.path()).unwrap()
    }

    #[test]
    fn test_handler_classification() {
        let outcome = assess(&[(
            "h.py",
            "import logging\n\ntry:\n    pass\nexcept ValueError:\n    pass\nexcept Exception as e:\n    pass\nexcept:\n    pass\n",
        )]);
        assert_eq!(outcome.details[0], "Codebase appears to use the 'logging' module.");
        assert_eq!(
            outcome.details[1],
            "Error handling quality: 33.33% (1/3 specific handlers)"
        );
        assert!(outcome.details[2].starts_with("Generic 'except Exception' used in "));
        assert!(outcome.details[2].ends_with("h.py:7"));
        assert!(outcome.details[3].starts_with("Bare 'except:' used in "));
        assert!((outcome.score - (8.0 / 3.0 + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_no_handlers() {
        let with_logging = assess(&[("a.py", "import logging.handlers\nx = 1\n")]);
        assert_eq!(with_logging.score, 5.0);
        let without = assess(&[("a.py", "x = 1\n")]);
        assert_eq!(without.score, 2.0);
        assert_eq!(
            without.details,
            vec!["Codebase does not appear to use the 'logging' module."]
        );
    }

    #[test]
    fn test_all_specific_without_logging() {
        let outcome = assess(&[(
            "a.py",
            "try:\n    pass\nexcept (KeyError, IndexError):\n    pass\n",
        )]);
        assert_eq!(outcome.score, 8.0);
    }
}
