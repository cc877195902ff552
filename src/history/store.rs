//! redb-backed run store
//!
//! One table, `runs`, keyed by a monotonic `u64` id with the JSON-encoded
//! [`BenchmarkRun`] as value. Iterating the table in reverse yields the most
//! recent runs first.

use super::RunRecorder;
use crate::models::BenchmarkRun;
use anyhow::{Context, Result};
use redb::{Database, ReadableTable, TableDefinition};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

const RUNS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("runs");

/// Append-only history of comparisons.
pub struct RunStore {
    db: Database,
    path: PathBuf,
}

impl RunStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let db = Database::create(path)
            .with_context(|| format!("Failed to open run history at {}", path.display()))?;
        debug!("Opened run history at {}", path.display());
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// `<data dir>/repobench/history.redb`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("repobench").join("history.redb"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunRecorder for RunStore {
    fn record(
        &self,
        codebase1: &str,
        codebase2: &str,
        total1: f64,
        total2: f64,
        details: &Value,
    ) -> Result<u64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(RUNS_TABLE)?;
            let id = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            let run = BenchmarkRun {
                id,
                timestamp: chrono::Utc::now().to_rfc3339(),
                codebase1: codebase1.to_string(),
                codebase2: codebase2.to_string(),
                total1,
                total2,
                details_json: serde_json::to_string(details)?,
            };
            let value = serde_json::to_vec(&run)?;
            table.insert(id, value.as_slice())?;
            id
        };
        write_txn.commit()?;
        debug!("Recorded run {} in {}", id, self.path.display());
        Ok(id)
    }

    fn fetch_recent(&self, limit: usize) -> Result<Vec<BenchmarkRun>> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(RUNS_TABLE) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut runs = Vec::new();
        for item in table.iter()?.rev().take(limit) {
            let (key, value) = item?;
            let run: BenchmarkRun = serde_json::from_slice(value.value())
                .with_context(|| format!("Corrupt run record {}", key.value()))?;
            runs.push(run);
        }
        Ok(runs)
    }
}
