//! GitHealth: churn hotspots and bus factor over the last six months

use super::base::{Assessor, AssessorSettings, NO_PYTHON_FILES};
use crate::git::GitHistory;
use crate::models::AssessmentOutcome;
use crate::parsers;
use anyhow::Result;
use chrono::{Duration, Utc};
use std::path::Path;
use tracing::debug;

const WINDOW_DAYS: i64 = 180;
const MAX_COMMITS: usize = 10_000;
const HOTSPOTS: usize = 5;

pub struct GitHealthAssessor;

impl GitHealthAssessor {
    pub fn new(_settings: &AssessorSettings) -> Self {
        Self
    }
}

fn churn_score(avg_churn: f64, bus_factor: usize) -> f64 {
    let base = match avg_churn {
        c if c < 3.0 => 9.0,
        c if c < 10.0 => 7.0,
        c if c < 20.0 => 5.0,
        _ => 3.0,
    };
    (base + (bus_factor as f64 / 5.0).min(2.0)).min(10.0)
}

impl Assessor for GitHealthAssessor {
    fn id(&self) -> &'static str {
        "git_health"
    }

    fn description(&self) -> &'static str {
        "Churn hotspots and bus factor from recent git history"
    }

    fn assess(&self, codebase: &Path) -> Result<AssessmentOutcome> {
        if parsers::python_files(codebase).is_empty() {
            return Ok(AssessmentOutcome::neutral(0.0, NO_PYTHON_FILES));
        }

        let history = match GitHistory::open(codebase) {
            Ok(history) => history,
            Err(e) => {
                debug!("git health skipped: {:#}", e);
                return Ok(AssessmentOutcome::neutral(
                    5.0,
                    "Not a git repository; skipping git health checks.",
                ));
            }
        };

        let prefix = history.relative_prefix(codebase)?;
        let since = Utc::now() - Duration::days(WINDOW_DAYS);
        let churn = history.churn_since(&prefix, ".py", since, MAX_COMMITS)?;

        if churn.file_commits.is_empty() {
            return Ok(
                AssessmentOutcome::neutral(8.0, "Low churn detected in the last 6 months.")
                    .with_metric("commits_analyzed", churn.commits_analyzed),
            );
        }

        let avg_churn = churn.average_churn();
        let bus_factor = churn.authors.len();

        let mut details = vec![format!(
            "Average churn / file: {:.1} commits in last 6 months.",
            avg_churn
        )];
        details.extend(
            churn
                .hotspots(HOTSPOTS)
                .into_iter()
                .map(|(file, n)| format!("{} changed {} times in last 6 months.", file, n)),
        );
        details.push(format!("Bus factor (unique committers): {}", bus_factor));

        Ok(
            AssessmentOutcome::new(churn_score(avg_churn, bus_factor), details)
                .with_metric("avg_churn", avg_churn)
                .with_metric("files_changed", churn.file_commits.len())
                .with_metric("bus_factor", bus_factor)
                .with_metric("commits_analyzed", churn.commits_analyzed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::history::tests::commit_files;
    use git2::Repository;

    #[test]
    fn test_churn_score_bands() {
        assert!((churn_score(1.0, 1) - 9.2).abs() < 1e-9);
        assert_eq!(churn_score(5.0, 0), 7.0);
        assert_eq!(churn_score(15.0, 20), 7.0);
        assert_eq!(churn_score(25.0, 5), 4.0);
        assert_eq!(churn_score(0.5, 50), 10.0);
    }

    #[test]
    fn test_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let outcome = GitHealthAssessor.assess(dir.path()).unwrap();
        assert_eq!(outcome.score, 5.0);
        assert_eq!(
            outcome.details,
            vec!["Not a git repository; skipping git health checks."]
        );
    }

    #[test]
    fn test_uncommitted_files_are_low_churn() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let outcome = GitHealthAssessor.assess(dir.path()).unwrap();
        assert_eq!(outcome.score, 8.0);
        assert_eq!(outcome.details, vec!["Low churn detected in the last 6 months."]);
    }

    #[test]
    fn test_reports_hotspots() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let first = [("core.py", "a = 1\n"), ("util.py", "b = 1\n")];
        commit_files(&repo, "a@example.com", "one", &first).unwrap();
        commit_files(&repo, "b@example.com", "two", &[("core.py", "a = 2\n")]).unwrap();

        let outcome = GitHealthAssessor.assess(dir.path()).unwrap();
        assert_eq!(
            outcome.details,
            vec![
                "Average churn / file: 1.5 commits in last 6 months.",
                "core.py changed 2 times in last 6 months.",
                "util.py changed 1 times in last 6 months.",
                "Bus factor (unique committers): 2",
            ]
        );
        assert!((outcome.score - 9.4).abs() < 1e-9);
    }
}
