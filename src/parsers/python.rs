//! Python parsing using tree-sitter
//!
//! Assessors share one parsed representation per file: the source text and its
//! syntax tree, plus helpers for the handful of queries they need (functions,
//! imports, docstrings, branch complexity).

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// A Python file that parsed without syntax errors.
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
}

/// A function or method definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    /// 1-based
    pub line: usize,
    pub is_async: bool,
    pub complexity: u32,
    pub docstring: Option<String>,
}

/// A class definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub line: usize,
    pub docstring: Option<String>,
}

impl ParsedFile {
    /// Read and parse a Python file
    pub fn parse(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        Self::parse_source(source, path)
    }

    /// Parse Python source directly (useful for testing)
    pub fn parse_source(source: String, path: &Path) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .context("Failed to set Python language")?;

        let tree = parser
            .parse(&source, None)
            .context("Failed to parse Python source")?;

        if tree.root_node().has_error() {
            bail!("Syntax error in {}", path.display());
        }

        Ok(Self {
            path: path.to_path_buf(),
            source,
            tree,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// `path:line` for a node, used in detail lines
    pub fn location(&self, node: Node<'_>) -> String {
        format!("{}:{}", self.path.display(), line_of(node))
    }

    /// Visit every node in the file, pre-order.
    pub fn for_each_node<'t>(&'t self, f: impl FnMut(Node<'t>)) {
        for_each_descendant(self.root(), f);
    }

    /// All function and method definitions, nested ones included.
    pub fn functions(&self) -> Vec<FunctionInfo> {
        let mut functions = Vec::new();
        self.for_each_node(|node| {
            if node.kind() != "function_definition" {
                return;
            }
            let Some(name) = node.child_by_field_name("name") else {
                return;
            };
            functions.push(FunctionInfo {
                name: self.text(name).to_string(),
                line: line_of(node),
                is_async: is_async_function(node),
                complexity: calculate_complexity(node),
                docstring: node
                    .child_by_field_name("body")
                    .and_then(|body| self.block_docstring(body)),
            });
        });
        functions
    }

    pub fn classes(&self) -> Vec<ClassInfo> {
        let mut classes = Vec::new();
        self.for_each_node(|node| {
            if node.kind() != "class_definition" {
                return;
            }
            let Some(name) = node.child_by_field_name("name") else {
                return;
            };
            classes.push(ClassInfo {
                name: self.text(name).to_string(),
                line: line_of(node),
                docstring: node
                    .child_by_field_name("body")
                    .and_then(|body| self.block_docstring(body)),
            });
        });
        classes
    }

    /// Module docstring, if the first statement is a string literal.
    pub fn module_docstring(&self) -> Option<String> {
        self.block_docstring(self.root())
    }

    /// Imported module names (`import a.b` gives `a.b`, `from x import y` gives `x`).
    pub fn imports(&self) -> Vec<String> {
        let mut modules = Vec::new();
        self.for_each_node(|node| match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    let name = match child.kind() {
                        "dotted_name" => Some(child),
                        "aliased_import" => child.child_by_field_name("name"),
                        _ => None,
                    };
                    if let Some(name) = name {
                        modules.push(self.text(name).to_string());
                    }
                }
            }
            "import_from_statement" => {
                if let Some(module) = node.child_by_field_name("module_name") {
                    modules.push(self.text(module).trim_start_matches('.').to_string());
                }
            }
            _ => {}
        });
        modules
    }

    /// Docstring of a module or a block: the first statement, when it is a
    /// bare string literal.
    fn block_docstring(&self, block: Node<'_>) -> Option<String> {
        let mut cursor = block.walk();
        let first = block
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment")?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let expr = first.named_child(0)?;
        if expr.kind() != "string" {
            return None;
        }
        let literal = self.text(expr);
        if literal.starts_with(['f', 'F']) || literal.starts_with(['b', 'B']) {
            return None;
        }
        Some(strip_string_literal(literal).to_string())
    }
}

/// 1-based line number of a node
pub fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Visit `root` and all of its descendants, pre-order.
pub fn for_each_descendant<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    let mut depth = 0usize;
    loop {
        f(cursor.node());
        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        loop {
            if depth == 0 {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            cursor.goto_parent();
            depth -= 1;
        }
    }
}

/// True when `node` has an ancestor of one of `kinds` strictly between it and `stop`.
pub fn has_ancestor_kind(node: Node<'_>, kinds: &[&str], stop: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.id() == stop.id() {
            return false;
        }
        if kinds.contains(&parent.kind()) {
            return true;
        }
        current = parent.parent();
    }
    false
}

fn is_async_function(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let is_async = node
        .children(&mut cursor)
        .any(|child| child.kind() == "async");
    is_async
}

/// Strip prefix letters and quotes from a Python string literal.
fn strip_string_literal(literal: &str) -> &str {
    let body = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= quote.len() * 2 && body.starts_with(quote) && body.ends_with(quote) {
            return &body[quote.len()..body.len() - quote.len()];
        }
    }
    body
}

/// Cyclomatic complexity of a function.
///
/// Nested function bodies are scored on their own and do not count here.
pub fn calculate_complexity(node: Node<'_>) -> u32 {
    let mut complexity = 1; // Base complexity

    fn count_branches(node: Node<'_>, complexity: &mut u32) {
        match node.kind() {
            // Control flow
            "if_statement" | "elif_clause" | "while_statement" | "for_statement" => {
                *complexity += 1;
            }
            // Exception handling
            "except_clause" => {
                *complexity += 1;
            }
            // Boolean operators (each 'and'/'or' adds a branch)
            "boolean_operator" => {
                *complexity += 1;
            }
            // Ternary/conditional expression
            "conditional_expression" => {
                *complexity += 1;
            }
            // Comprehensions with conditions
            "list_comprehension" | "dictionary_comprehension" | "set_comprehension"
            | "generator_expression" => {
                for child in node.children(&mut node.walk()) {
                    if child.kind() == "if_clause" {
                        *complexity += 1;
                    }
                }
            }
            // Match statement (Python 3.10+): each case adds a branch
            "case_clause" => {
                *complexity += 1;
            }
            _ => {}
        }

        for child in node.children(&mut node.walk()) {
            if child.kind() == "function_definition" || child.kind() == "class_definition" {
                continue;
            }
            count_branches(child, complexity);
        }
    }

    count_branches(node, &mut complexity);
    complexity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedFile {
        ParsedFile::parse_source(source.to_string(), Path::new("test.py"))
            .expect("should parse")
    }

    #[test]
    fn test_complexity_calculation() {
        let file = parse(
            r#"
def complex_function(x):
    if x > 0:
        if x > 10:
            return "big"
        else:
            return "small positive"
    elif x < 0:
        return "negative"
    else:
        return "zero"
"#,
        );
        let functions = file.functions();
        // Base (1) + if (1) + if (1) + elif (1) = 4
        assert_eq!(functions[0].complexity, 4);
    }

    #[test]
    fn test_nested_function_scored_separately() {
        let file = parse(
            r#"
def outer(items):
    def inner(x):
        if x and x > 2:
            return 1
        return 0
    return [inner(i) for i in items]
"#,
        );
        let functions = file.functions();
        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].name, "outer");
        assert_eq!(functions[0].complexity, 1);
        assert_eq!(functions[1].name, "inner");
        assert_eq!(functions[1].complexity, 3);
    }

    #[test]
    fn test_async_and_docstrings() {
        let file = parse(
            r#"
# leading comment
"""Module doc."""

class Greeter:
    '''Says hello.'''

    async def greet(self):
        """Greet.

        Args:
            none
        """
        return "hi"

def plain():
    return 1
"#,
        );
        assert_eq!(file.module_docstring().as_deref(), Some("Module doc."));

        let classes = file.classes();
        assert_eq!(classes[0].name, "Greeter");
        assert_eq!(classes[0].docstring.as_deref(), Some("Says hello."));

        let functions = file.functions();
        assert!(functions[0].is_async);
        assert!(functions[0].docstring.as_deref().unwrap().contains("Args:"));
        assert!(!functions[1].is_async);
        assert!(functions[1].docstring.is_none());
    }

    #[test]
    fn test_imports() {
        let file = parse(
            r#"
import os, logging.handlers as lh
from multiprocessing import Pool
from . import sibling
"#,
        );
        let imports = file.imports();
        assert!(imports.contains(&"os".to_string()));
        assert!(imports.contains(&"logging.handlers".to_string()));
        assert!(imports.contains(&"multiprocessing".to_string()));
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let result = ParsedFile::parse_source("def broken(:\n".into(), Path::new("bad.py"));
        assert!(result.is_err());
    }

    #[test]
    fn test_strip_string_literal() {
        assert_eq!(strip_string_literal(r#""""doc""""#), "doc");
        assert_eq!(strip_string_literal("r'raw'"), "raw");
        assert_eq!(strip_string_literal("\"x\""), "x");
    }
}
