//! Error types for version control and branch management.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from a version control operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    /// git not found in PATH.
    #[error("git not found in PATH")]
    NotFound,

    /// A git command exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// I/O error while talking to git.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for GitError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            GitError::NotFound
        } else {
            GitError::Io(e.to_string())
        }
    }
}

/// Result type alias for version control operations.
pub type Result<T> = std::result::Result<T, GitError>;

/// Errors from preparing the feature branch.
///
/// All of these abort a workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BranchError {
    /// Target directory is not a working tree.
    #[error("{} is not a git working tree", .0.display())]
    NotARepository(PathBuf),

    /// The trunk branch could not be checked out.
    #[error("failed to check out trunk '{branch}': {source}")]
    TrunkCheckout {
        branch: String,
        #[source]
        source: GitError,
    },

    /// Any other git failure while preparing the branch.
    #[error(transparent)]
    Git(#[from] GitError),
}
