//! Error types for the orchestrator.

use std::path::PathBuf;

use devflow_core::ClassificationError;
use devflow_git::BranchError;
use devflow_models::AgentRole;
use thiserror::Error;

/// Errors that abort a workflow run.
///
/// Everything else a run encounters is recorded as a degraded step.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Input could not be classified.
    #[error("classification failed: {0}")]
    Classification(#[from] ClassificationError),

    /// Target directory is not a working tree.
    #[error("{} is not a git working tree", .0.display())]
    NotARepository(PathBuf),

    /// Feature branch could not be prepared.
    #[error("branch preparation failed: {0}")]
    Branch(BranchError),

    /// A role the workflow cannot do without failed on every tool.
    #[error("{role} agent failed: {reasons}")]
    MandatoryAgentFailed { role: AgentRole, reasons: String },
}

impl From<BranchError> for WorkflowError {
    fn from(e: BranchError) -> Self {
        match e {
            BranchError::NotARepository(path) => WorkflowError::NotARepository(path),
            other => WorkflowError::Branch(other),
        }
    }
}

/// Merge request creation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeRequestError {
    /// The platform CLI is not installed.
    #[error("`{0}` not found in PATH")]
    CliUnavailable(String),

    /// The remote's host is not a supported platform.
    #[error("unsupported hosting platform")]
    UnsupportedPlatform,

    /// The platform CLI exceeded its timeout.
    #[error("platform CLI timed out after {0}s")]
    TimedOut(u64),

    /// The platform CLI ran and reported an error.
    #[error("platform CLI failed: {0}")]
    Failed(String),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
