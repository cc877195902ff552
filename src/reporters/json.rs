//! JSON reporter
//!
//! Outputs the export document: both inputs, both totals and every
//! per-assessor table, keyed by assessor display name.

use crate::engine::ComparisonReport;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Render report as JSON
pub fn render(report: &ComparisonReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&report.export_document())?)
}

/// Write the export document to `path`, creating parent directories.
pub fn write_export(report: &ComparisonReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, render(report)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Exported results to {}", path.display());
    Ok(())
}
