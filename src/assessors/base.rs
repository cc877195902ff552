//! Assessor trait and shared settings
//!
//! This module defines the contract every quality dimension implements:
//! - `Assessor` trait: one score plus explanatory details per codebase
//! - `AssessorSettings`: explicit configuration handed to assessors at
//!   construction time (no process-wide environment lookups)

use crate::ai::AiConfig;
use crate::models::AssessmentOutcome;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Default wall-clock cap for analysis tools (bandit, radon, pytest, ...)
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 300;
/// Dynamic security scans are capped at two minutes
pub const DEFAULT_ZAP_TIMEOUT_SECS: u64 = 120;
/// Number of profiling samples per codebase
pub const DEFAULT_PROFILE_RUNS: usize = 3;

/// Configuration threaded into assessors.
#[derive(Debug, Clone)]
pub struct AssessorSettings {
    /// Interpreter used for `python -m <tool>` fallbacks and pytest
    pub python: String,
    pub tool_timeout_secs: u64,
    /// Script executed under the profilers (performance)
    pub profile_script: Option<PathBuf>,
    pub profile_runs: usize,
    /// Running web app to scan dynamically (security)
    pub web_app_url: Option<String>,
    pub zap_timeout_secs: u64,
    /// When set, the LLM score assessor is registered
    pub llm: Option<AiConfig>,
}

impl Default for AssessorSettings {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            profile_script: None,
            profile_runs: DEFAULT_PROFILE_RUNS,
            web_app_url: None,
            zap_timeout_secs: DEFAULT_ZAP_TIMEOUT_SECS,
            llm: None,
        }
    }
}

/// One quality dimension.
///
/// `assess` receives a directory the caller has already validated. Anything
/// the assessor cannot meaningfully analyze (no source files, missing tool,
/// unreachable service) must come back as `Ok` with a low or neutral score and
/// a detail line saying why. `Err` is reserved for genuine failures; the
/// comparison engine turns those, and panics, into a zero score.
///
/// Assessors may spawn processes and write scratch files, but must leave the
/// codebase untouched and remove their scratch files on every path.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct LineCountAssessor;
///
/// impl Assessor for LineCountAssessor {
///     fn id(&self) -> &'static str {
///         "line_count"
///     }
///
///     fn description(&self) -> &'static str {
///         "Rewards small codebases"
///     }
///
///     fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
///         Ok(AssessmentOutcome::neutral(5.0, "Nothing to see here."))
///     }
/// }
/// ```
pub trait Assessor: Send + Sync {
    /// Stable snake_case identifier; the display name derives from it
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome>;
}

pub(crate) const NO_PYTHON_FILES: &str = "No Python files found.";
