//! Run-scoped storage for agent result files.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use devflow_models::{AgentRole, RunId};

use crate::atomic::atomic_create;
use crate::error::Result;

const OUTPUTS_SUBDIR: &str = "outputs";

/// Writes agent outputs for a single run.
///
/// ```text
/// base_path/
/// └── outputs/
///     └── {run_id}/
///         ├── coder-20261019T101502.481223-0.md
///         └── reviewer-20261019T101544.902117-1.md
/// ```
///
/// Names combine role, timestamp and a per-store sequence number so calls
/// within the same run never collide.
#[derive(Debug)]
pub struct OutputStore {
    run_dir: PathBuf,
    sequence: AtomicU32,
}

impl OutputStore {
    /// Creates a store for `run_id` under the given state directory.
    pub fn for_run(base_path: impl AsRef<Path>, run_id: &RunId) -> Self {
        Self {
            run_dir: base_path
                .as_ref()
                .join(OUTPUTS_SUBDIR)
                .join(run_id.as_str()),
            sequence: AtomicU32::new(0),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Writes an agent result and returns the file path.
    ///
    /// # Errors
    /// Fails if the directory or file cannot be written.
    pub fn write(&self, role: AgentRole, content: &str) -> Result<PathBuf> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let name = format!(
            "{}-{}-{}.md",
            role,
            Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            seq
        );
        let path = self.run_dir.join(name);
        atomic_create(&path, content.as_bytes())?;
        Ok(path)
    }
}
