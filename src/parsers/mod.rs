//! Python source discovery and parsing
//!
//! Every assessor walks the codebase on its own through these helpers.
//! Nothing is cached between assessors.

pub mod python;

pub use python::{ClassInfo, FunctionInfo, ParsedFile};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// All `.py` files under `root`, sorted.
///
/// Hidden entries (`.venv`, `.tox`, `.git`) and paths matched by the
/// codebase's own `.gitignore` are skipped, whether or not `root` is a
/// git checkout. Global git excludes are not consulted.
pub fn python_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .git_global(false)
        .git_exclude(true)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("py"))
        .collect();
    files.sort();
    files
}

/// Number of lines containing something other than whitespace.
pub fn count_non_blank_lines(path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(content.lines().filter(|line| !line.trim().is_empty()).count())
}

/// Files split by whether they parsed.
pub struct ParsedCodebase {
    pub files: Vec<ParsedFile>,
    pub unparseable: Vec<PathBuf>,
}

/// Parse files in parallel. Order follows the input.
pub fn parse_files(paths: &[PathBuf]) -> ParsedCodebase {
    let results: Vec<(PathBuf, Result<ParsedFile>)> = paths
        .par_iter()
        .map(|path| (path.clone(), ParsedFile::parse(path)))
        .collect();

    let mut files = Vec::with_capacity(results.len());
    let mut unparseable = Vec::new();
    for (path, result) in results {
        match result {
            Ok(parsed) => files.push(parsed),
            Err(e) => {
                debug!("Skipping {}: {:#}", path.display(), e);
                unparseable.push(path);
            }
        }
    }
    ParsedCodebase { files, unparseable }
}
