//! Append-only store for workflow records.

use std::path::{Path, PathBuf};

use devflow_models::WorkflowRecord;
use tracing::debug;

use crate::atomic::atomic_create_json;
use crate::error::Result;

const RECORDS_SUBDIR: &str = "workflows";

/// Persists one JSON document per workflow run.
///
/// ```text
/// base_path/
/// └── workflows/
///     ├── feature-20261019T101500.123Z-1a2b3c4d.json
///     └── audit-20261019T111200.042Z-5e6f7a8b.json
/// ```
///
/// Files are created, never replaced. The orchestrator does not read them
/// back; they exist for people and external tooling.
#[derive(Debug, Clone)]
pub struct RecordStore {
    base_path: PathBuf,
}

impl RecordStore {
    /// Creates a store rooted at the given state directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory holding the record files.
    pub fn records_dir(&self) -> PathBuf {
        self.base_path.join(RECORDS_SUBDIR)
    }

    /// File name for a record: workflow type, timestamp, run id.
    pub fn file_name(record: &WorkflowRecord) -> String {
        format!(
            "{}-{}-{}.json",
            record.workflow_type,
            record.timestamp.format("%Y%m%dT%H%M%S%.3fZ"),
            record.id.short()
        )
    }

    /// Writes a record and returns its path.
    ///
    /// # Errors
    /// Fails if the directory cannot be created, the record cannot be
    /// serialized, or a file with the same name already exists.
    pub fn append(&self, record: &WorkflowRecord) -> Result<PathBuf> {
        let path = self.records_dir().join(Self::file_name(record));
        atomic_create_json(&path, record)?;
        debug!(path = %path.display(), status = ?record.status, "workflow record written");
        Ok(path)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
