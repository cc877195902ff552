//! Git history analysis
//!
//! Commit walking and churn aggregation backing the GitHealth assessor.
//!
//! # Example
//!
//! ```no_run
//! use repobench::git::GitHistory;
//! use std::path::Path;
//!
//! let history = GitHistory::open(Path::new("/path/to/repo")).unwrap();
//! let commits = history.get_recent_commits(50, None).unwrap();
//! println!("{} recent commits", commits.len());
//! ```

pub mod history;

pub use history::{ChurnSummary, CommitInfo, GitHistory};
