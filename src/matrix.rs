//! The run's matrix map.
//!
//! Each run directory carries a `matrix_ids.json` written when the matrices
//! were created, mapping a matrix id to where its results were stored and
//! how it finished:
//!
//! ```json
//! {
//!   "matrix-1a2b3c": {
//!     "matrixId": "matrix-1a2b3c",
//!     "state": "FINISHED",
//!     "gcsPath": "bucket/2024-05-01_10-00-00/shard_0",
//!     "webLink": "https://console.example.test/matrices/1a2b3c",
//!     "outcome": "success"
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the matrix map inside a run directory.
pub const MATRIX_IDS_FILE: &str = "matrix_ids.json";

/// How a matrix finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixOutcome {
    Success,
    Failure,
    Inconclusive,
    Skipped,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One matrix as recorded at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedMatrix {
    pub matrix_id: String,
    pub state: String,
    pub gcs_path: String,
    pub web_link: String,
    pub outcome: MatrixOutcome,
    pub timestamp: Option<DateTime<Utc>>,
    pub billable_virtual_minutes: u64,
    pub billable_physical_minutes: u64,
}

impl SavedMatrix {
    pub fn successful(&self) -> bool {
        self.outcome == MatrixOutcome::Success
    }
}

/// Process exit status derived from the matrices.
///
/// | Code | Meaning |
/// |------|---------|
/// | 0 | Every matrix succeeded |
/// | 10 | At least one matrix did not succeed |
///
/// Report generation failures exit with 1 from `main`, so they are never
/// confused with failing tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    TestsFailed,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::TestsFailed => 10,
        }
    }
}

/// All matrices of one run, keyed by matrix id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMatrixMap {
    run_path: PathBuf,
    matrices: BTreeMap<String, SavedMatrix>,
}

impl RunMatrixMap {
    pub fn new(run_path: impl Into<PathBuf>, matrices: BTreeMap<String, SavedMatrix>) -> Self {
        Self {
            run_path: run_path.into(),
            matrices,
        }
    }

    /// Loads `matrix_ids.json` from `run_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(run_path: &Path) -> Result<Self> {
        let file = run_path.join(MATRIX_IDS_FILE);
        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read matrix map: {}", file.display()))?;
        let matrices: BTreeMap<String, SavedMatrix> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse matrix map: {}", file.display()))?;

        tracing::debug!("Loaded {} matrices from {}", matrices.len(), file.display());

        Ok(Self::new(run_path, matrices))
    }

    /// The local run directory.
    pub fn run_path(&self) -> &Path {
        &self.run_path
    }

    pub fn matrices(&self) -> impl Iterator<Item = (&String, &SavedMatrix)> {
        self.matrices.iter()
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Finds the first matrix (in id order) whose storage path ends with
    /// `matrix_path`.
    pub fn find_by_path_suffix(&self, matrix_path: &str) -> Option<&SavedMatrix> {
        self.matrices
            .values()
            .find(|m| m.gcs_path.trim_end_matches('/').ends_with(matrix_path))
    }

    /// `true` if every matrix succeeded. An empty map counts as successful.
    pub fn all_successful(&self) -> bool {
        self.matrices.values().all(SavedMatrix::successful)
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.all_successful() {
            ExitStatus::Success
        } else {
            ExitStatus::TestsFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MATRIX_IDS: &str = r#"{
        "matrix-b": {
            "matrixId": "matrix-b",
            "state": "FINISHED",
            "gcsPath": "bucket/2024-05-01_10-00-00/shard_1/",
            "webLink": "https://console.example.test/b",
            "outcome": "failure",
            "timestamp": "2024-05-01T10:05:00Z"
        },
        "matrix-a": {
            "matrixId": "matrix-a",
            "state": "FINISHED",
            "gcsPath": "bucket/2024-05-01_10-00-00/shard_0",
            "webLink": "https://console.example.test/a",
            "outcome": "success",
            "billableVirtualMinutes": 3
        }
    }"#;

    #[test]
    fn test_load_matrix_map() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MATRIX_IDS_FILE), MATRIX_IDS).unwrap();

        let map = RunMatrixMap::load(dir.path()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.run_path(), dir.path());

        let ids: Vec<_> = map.matrices().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["matrix-a", "matrix-b"]);

        let a = map.find_by_path_suffix("2024-05-01_10-00-00/shard_0").unwrap();
        assert_eq!(a.web_link, "https://console.example.test/a");
        assert_eq!(a.billable_virtual_minutes, 3);

        let b = map.find_by_path_suffix("2024-05-01_10-00-00/shard_1").unwrap();
        assert!(b.timestamp.is_some());
        assert!(map.find_by_path_suffix("2024-05-01_10-00-00/shard_9").is_none());
    }

    #[test]
    fn test_exit_status() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MATRIX_IDS_FILE), MATRIX_IDS).unwrap();
        let map = RunMatrixMap::load(dir.path()).unwrap();

        assert!(!map.all_successful());
        assert_eq!(map.exit_status(), ExitStatus::TestsFailed);
        assert_eq!(map.exit_status().code(), 10);

        assert_eq!(RunMatrixMap::default().exit_status().code(), 0);
    }

    #[test]
    fn test_unknown_outcome_is_not_success() {
        let matrix: SavedMatrix = serde_json::from_str(r#"{"outcome": "flaky"}"#).unwrap();
        assert_eq!(matrix.outcome, MatrixOutcome::Unknown);
        assert!(!matrix.successful());
    }

    #[test]
    fn test_missing_matrix_map_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(RunMatrixMap::load(dir.path()).is_err());
    }
}
