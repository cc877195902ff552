//! Error taxonomy for comparisons
//!
//! `InvalidInput` is the only kind that stops a comparison. The others are
//! recovered where they happen and surface as detail lines or log warnings.

use crate::assessors::external_tool::ToolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    /// Bad directory path, malformed weight JSON, invalid option values
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A skip list or weight map referenced an unregistered assessor
    #[error("No assessor named '{0}'")]
    NotFound(String),

    #[error("{assessor} failed: {reason}")]
    AssessorFailure { assessor: String, reason: String },

    /// A wrapped analysis tool is missing or mis-configured
    #[error("{tool} is not available: {reason}")]
    ExternalToolUnavailable { tool: String, reason: String },

    #[error("Run history unavailable: {0}")]
    PersistenceFailure(String),
}

pub type BenchResult<T> = Result<T, BenchError>;

/// A tool run that produced nothing usable leaves the assessor on its fallback.
impl From<ToolError> for BenchError {
    fn from(err: ToolError) -> Self {
        let (tool, reason) = match err {
            ToolError::NotInstalled { tool } => (tool, "not installed or not on PATH".to_string()),
            ToolError::TimedOut { tool, secs } => (tool, format!("timed out after {}s", secs)),
            ToolError::Failed { tool, reason } => (tool, reason),
            ToolError::Unparseable { tool, reason } => (tool, format!("unreadable output ({})", reason)),
        };
        BenchError::ExternalToolUnavailable { tool, reason }
    }
}
