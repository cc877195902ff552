//! Git history extraction using libgit2
//!
//! Walks recent commits and aggregates per-file churn and authorship for a
//! subtree of the repository, using the git2 crate (Rust bindings to libgit2).

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use git2::{Repository, Sort};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Information about a git commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// Short hash (12 characters)
    pub hash: String,
    pub author_email: String,
    /// Commit timestamp (ISO 8601)
    pub timestamp: String,
    /// Commit message (first line)
    pub message: String,
    /// Repository-relative paths changed against the first parent
    pub files_changed: Vec<String>,
}

/// Churn aggregated over a window of commits.
#[derive(Debug, Clone, Default)]
pub struct ChurnSummary {
    /// Commits per matching file, keyed by repository-relative path
    pub file_commits: BTreeMap<String, usize>,
    /// Author emails of commits that touched the subtree
    pub authors: BTreeSet<String>,
    pub commits_analyzed: usize,
}

impl ChurnSummary {
    /// Mean commits per changed file; 0.0 when nothing changed
    pub fn average_churn(&self) -> f64 {
        if self.file_commits.is_empty() {
            return 0.0;
        }
        self.file_commits.values().sum::<usize>() as f64 / self.file_commits.len() as f64
    }

    /// Up to `n` files, most changed first, ties by path
    pub fn hotspots(&self, n: usize) -> Vec<(&str, usize)> {
        let mut files: Vec<(&str, usize)> = self
            .file_commits
            .iter()
            .map(|(path, count)| (path.as_str(), *count))
            .collect();
        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        files.truncate(n);
        files
    }
}

/// Git history analyzer using libgit2.
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Open the repository containing `path` (or any subdirectory of it).
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("Failed to open git repository at {:?}", path))?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    /// Check if a path is inside a git repository.
    pub fn is_git_repo(path: &Path) -> bool {
        Repository::discover(path).is_ok()
    }

    /// Get the repository root path.
    pub fn repo_root(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .context("Repository has no working directory (bare repo?)")
    }

    /// `path` relative to the working directory, with symlinks resolved on
    /// both sides. Empty for the root itself.
    pub fn relative_prefix(&self, path: &Path) -> Result<PathBuf> {
        let root = self
            .repo_root()?
            .canonicalize()
            .context("Failed to resolve repository root")?;
        let target = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let relative = target
            .strip_prefix(&root)
            .with_context(|| format!("{} is outside {}", target.display(), root.display()))?;
        Ok(relative.to_path_buf())
    }

    /// Recent commits, newest first.
    ///
    /// # Arguments
    /// * `max_commits` - Maximum number of commits to retrieve
    /// * `since` - Optional timestamp; older commits are not returned
    pub fn get_recent_commits(
        &self,
        max_commits: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitInfo>> {
        // A freshly initialized repository has no commits yet
        if self.repo.head().is_err() {
            debug!("Repository has no HEAD; no history to walk");
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head()?;

        let mut commits = Vec::new();

        for oid_result in revwalk {
            if commits.len() >= max_commits {
                break;
            }

            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            if let Some(since_ts) = since {
                let commit_dt = Utc.timestamp_opt(commit.time().seconds(), 0).single();
                if commit_dt.is_some_and(|dt| dt < since_ts) {
                    break; // Commits are sorted by time, so we can stop
                }
            }

            commits.push(self.extract_commit_info(&commit)?);
        }

        Ok(commits)
    }

    /// Aggregate churn for files under `prefix` whose path ends with `extension`.
    ///
    /// Every commit that touches anything under `prefix` contributes its
    /// author; only matching files are counted towards churn.
    pub fn churn_since(
        &self,
        prefix: &Path,
        extension: &str,
        since: DateTime<Utc>,
        max_commits: usize,
    ) -> Result<ChurnSummary> {
        let mut summary = ChurnSummary::default();

        for commit in self.get_recent_commits(max_commits, Some(since))? {
            let in_subtree: Vec<&String> = commit
                .files_changed
                .iter()
                .filter(|file| Path::new(file).starts_with(prefix))
                .collect();
            if in_subtree.is_empty() {
                continue;
            }

            summary.commits_analyzed += 1;
            summary.authors.insert(commit.author_email.clone());
            for file in in_subtree {
                if file.ends_with(extension) {
                    *summary.file_commits.entry(file.clone()).or_default() += 1;
                }
            }
        }

        debug!(
            "Churn under {:?}: {} files over {} commits",
            prefix,
            summary.file_commits.len(),
            summary.commits_analyzed
        );
        Ok(summary)
    }

    fn extract_commit_info(&self, commit: &git2::Commit) -> Result<CommitInfo> {
        let author = commit.author();
        let message = commit
            .message()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .to_string();

        let parent = commit.parent(0).ok();
        let tree = commit.tree()?;
        let parent_tree = parent.as_ref().map(|p| p.tree()).transpose()?;

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut files_changed = Vec::new();
        diff.foreach(
            &mut |delta, _| {
                if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
                    files_changed.push(path.to_string_lossy().to_string());
                }
                true
            },
            None,
            None,
            None,
        )?;

        let id = commit.id().to_string();
        Ok(CommitInfo {
            hash: id[..12.min(id.len())].to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            timestamp: format_git_time(&commit.time()),
            message,
            files_changed,
        })
    }
}

/// Format a git timestamp as ISO 8601.
fn format_git_time(time: &git2::Time) -> String {
    match Utc.timestamp_opt(time.seconds(), 0).single() {
        Some(dt) => dt.to_rfc3339(),
        None => "1970-01-01T00:00:00Z".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    /// Commit `files` (path, contents) as `email` on top of HEAD.
    pub(crate) fn commit_files(
        repo: &Repository,
        email: &str,
        message: &str,
        files: &[(&str, &str)],
    ) -> Result<()> {
        let root = repo.workdir().context("bare repo")?.to_path_buf();
        let sig = git2::Signature::now("Test User", email)?;
        let mut index = repo.index()?;
        for (path, contents) in files {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full, contents)?;
            index.add_path(Path::new(path))?;
        }
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        Ok(())
    }

    fn create_test_repo() -> Result<(tempfile::TempDir, Repository)> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        commit_files(&repo, "test@example.com", "Initial commit", &[("app.py", "x = 1\n")])?;
        Ok((dir, repo))
    }

    #[test]
    fn test_is_git_repo() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;
        assert!(GitHistory::is_git_repo(dir.path()));

        let non_repo = tempdir()?;
        assert!(!GitHistory::is_git_repo(non_repo.path()));
        Ok(())
    }

    #[test]
    fn test_get_recent_commits() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let history = GitHistory::open(dir.path())?;

        let commits = history.get_recent_commits(10, None)?;
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message, "Initial commit");
        assert_eq!(commits[0].files_changed, vec!["app.py"]);
        assert_eq!(commits[0].hash.len(), 12);
        Ok(())
    }

    #[test]
    fn test_unborn_head_has_no_commits() -> Result<()> {
        let dir = tempdir()?;
        Repository::init(dir.path())?;
        let history = GitHistory::open(dir.path())?;
        assert!(history.get_recent_commits(10, None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_churn_since_filters_subtree_and_extension() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        let pkg = [("pkg/core.py", "a = 1\n"), ("pkg/README", "hi")];
        commit_files(&repo, "a@example.com", "pkg", &pkg)?;
        commit_files(&repo, "b@example.com", "pkg again", &[("pkg/core.py", "a = 2\n")])?;
        commit_files(&repo, "c@example.com", "outside", &[("app.py", "x = 2\n")])?;

        let history = GitHistory::open(dir.path())?;
        let prefix = history.relative_prefix(&dir.path().join("pkg"))?;
        assert_eq!(prefix, PathBuf::from("pkg"));

        let since = Utc::now() - Duration::days(180);
        let summary = history.churn_since(&prefix, ".py", since, 1000)?;
        assert_eq!(summary.file_commits.get("pkg/core.py"), Some(&2));
        assert_eq!(summary.file_commits.len(), 1);
        assert_eq!(summary.authors.len(), 2);
        assert_eq!(summary.commits_analyzed, 2);
        assert_eq!(summary.average_churn(), 2.0);
        assert_eq!(summary.hotspots(5), vec![("pkg/core.py", 2)]);
        Ok(())
    }
}
