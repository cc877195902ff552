//! Run history
//!
//! Every comparison is appended to a local store so past results can be
//! listed with `repobench history`. Recording is best effort: a store that
//! cannot be opened or written only produces a warning.

mod store;

pub use store::RunStore;

use crate::engine::ComparisonReport;
use crate::error::BenchError;
use crate::models::BenchmarkRun;
use anyhow::Result;
use serde_json::Value;
use tracing::warn;

/// Append-only persistence for comparison runs.
pub trait RunRecorder {
    /// Store one run and return its id.
    fn record(
        &self,
        codebase1: &str,
        codebase2: &str,
        total1: f64,
        total2: f64,
        details: &Value,
    ) -> Result<u64>;

    /// Most recent runs first.
    fn fetch_recent(&self, limit: usize) -> Result<Vec<BenchmarkRun>>;
}

/// Record a finished comparison; failures are logged, never returned.
pub fn record_comparison(recorder: &dyn RunRecorder, report: &ComparisonReport) -> Option<u64> {
    let result = recorder.record(
        &report.first.path.display().to_string(),
        &report.second.path.display().to_string(),
        report.first.total,
        report.second.total,
        &report.results_bundle(),
    );
    match result {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("{}", BenchError::PersistenceFailure(format!("{:#}", e)));
            None
        }
    }
}
