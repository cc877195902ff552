//! `repobench history` command

use crate::config::UserConfig;
use crate::history::{RunRecorder, RunStore};
use crate::models::{BenchmarkRun, Winner};
use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;

fn winner_label(run: &BenchmarkRun) -> String {
    match run.winner() {
        Winner::First => short_name(&run.codebase1),
        Winner::Second => short_name(&run.codebase2),
        Winner::Tie => "tie".to_string(),
    }
}

fn short_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// RFC 3339 timestamp as `YYYY-MM-DD HH:MM`
fn short_timestamp(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Run the `repobench history` command.
pub fn run(history_db: Option<PathBuf>, limit: usize, json: bool) -> Result<()> {
    let config = UserConfig::load();
    let path = history_db
        .or_else(|| config.history.path.clone())
        .or_else(RunStore::default_path)
        .context("Could not determine a data directory for the run history; pass --history-db")?;
    let store = RunStore::open(&path)?;
    let runs = store.fetch_recent(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No comparisons recorded yet in {}.", path.display());
        return Ok(());
    }

    println!();
    println!(
        "  {:>4}  {:<16}  {:<24} {:>8}  {:<24} {:>8}  {}",
        "#", "When", "Codebase 1", "Total", "Codebase 2", "Total", "Winner"
    );
    println!("  {}", style("─".repeat(104)).dim());
    for run in &runs {
        println!(
            "  {:>4}  {:<16}  {:<24} {:>8.2}  {:<24} {:>8.2}  {}",
            run.id,
            short_timestamp(&run.timestamp),
            short_name(&run.codebase1),
            run.total1,
            short_name(&run.codebase2),
            run.total2,
            style(winner_label(run)).bold()
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(total1: f64, total2: f64) -> BenchmarkRun {
        BenchmarkRun {
            id: 1,
            timestamp: "2026-03-01T12:30:00+00:00".into(),
            codebase1: "/work/alpha".into(),
            codebase2: "/work/beta/".into(),
            total1,
            total2,
            details_json: "{}".into(),
        }
    }

    #[test]
    fn test_winner_label() {
        assert_eq!(winner_label(&run_with(2.0, 1.0)), "alpha");
        assert_eq!(winner_label(&run_with(1.0, 2.0)), "beta");
        assert_eq!(winner_label(&run_with(1.0, 1.0)), "tie");
    }

    #[test]
    fn test_short_timestamp() {
        assert_eq!(short_timestamp("2026-03-01T12:30:00+00:00"), "2026-03-01 12:30");
        assert_eq!(short_timestamp("yesterday"), "yesterday");
    }
}
