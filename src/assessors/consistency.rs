//! Consistency: naming conventions
//!
//! Classes should be CamelCase; functions (dunder methods excepted) and
//! assigned variables should be snake_case.

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use crate::models::AssessmentOutcome;
use crate::parsers::{self, python::line_of, ParsedFile};
use crate::scoring::clamp_score;
use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tree_sitter::Node;

fn camel_case() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").expect("valid regex"))
}

fn snake_case() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid regex"))
}

pub struct ConsistencyAssessor;

impl ConsistencyAssessor {
    pub fn new(_settings: &AssessorSettings) -> Self {
        Self
    }
}

#[derive(Default)]
struct NameCheck {
    total: usize,
    inconsistent: usize,
    details: Vec<String>,
}

impl NameCheck {
    fn check(
        &mut self,
        ok: bool,
        what: &str,
        name: &str,
        style: &str,
        file: &ParsedFile,
        line: usize,
    ) {
        self.total += 1;
        if !ok {
            self.inconsistent += 1;
            self.details.push(format!(
                "Inconsistent {} name: '{}' should be {}. ({}:{})",
                what,
                name,
                style,
                file.path.display(),
                line
            ));
        }
    }
}

/// Identifiers bound by an assignment target, unpacking tuple/list patterns.
fn bound_names<'t>(target: Node<'t>, out: &mut Vec<Node<'t>>) {
    match target.kind() {
        "identifier" => out.push(target),
        "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern" | "tuple"
        | "list" | "parenthesized_expression" => {
            let mut cursor = target.walk();
            for child in target.named_children(&mut cursor) {
                bound_names(child, out);
            }
        }
        _ => {}
    }
}

/// The node holding binding targets for statements that bind names.
fn binding_target(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "assignment" | "augmented_assignment" | "for_statement" | "for_in_clause" => {
            node.child_by_field_name("left")
        }
        "named_expression" => node.child_by_field_name("name"),
        _ => None,
    }
}

impl ConsistencyAssessor {
    fn check_file(&self, file: &ParsedFile, check: &mut NameCheck) {
        file.for_each_node(|node| match node.kind() {
            "class_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = file.text(name);
                    let ok = camel_case().is_match(name);
                    check.check(ok, "class", name, "CamelCase", file, line_of(node));
                }
            }
            "function_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = file.text(name);
                    if !name.starts_with("__") {
                        let ok = snake_case().is_match(name);
                        check.check(ok, "function", name, "snake_case", file, line_of(node));
                    }
                }
            }
            _ => {
                if let Some(target) = binding_target(node) {
                    let mut names = Vec::new();
                    bound_names(target, &mut names);
                    for ident in names {
                        let name = file.text(ident);
                        let ok = snake_case().is_match(name);
                        check.check(ok, "variable", name, "snake_case", file, line_of(ident));
                    }
                }
            }
        });
    }
}

impl Assessor for ConsistencyAssessor {
    fn id(&self) -> &'static str {
        "consistency"
    }

    fn description(&self) -> &'static str {
        "Naming conventions: CamelCase classes, snake_case functions and variables"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        let files = parsers::python_files(codebase);
        if files.is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }
        let parsed = parsers::parse_files(&files);

        let mut check = NameCheck::default();
        for file in &parsed.files {
            self.check_file(file, &mut check);
        }

        if check.total == 0 {
            return Ok(AssessmentOutcome::neutral(10.0, "No relevant names found to check."));
        }

        let consistent = check.total - check.inconsistent;
        let ratio = consistent as f64 / check.total as f64;
        let mut details = vec![format!(
            "Naming consistency: {:.2}% ({}/{} consistent)",
            ratio * 100.0,
            consistent,
            check.total
        )];
        details.extend(check.details);

        Ok(AssessmentOutcome::new(clamp_score(ratio * 10.0), details)
            .with_metric("names_checked", check.total)
            .with_metric("inconsistent_names", check.inconsistent))
    }
}
