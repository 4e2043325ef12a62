//! Version control capability.

use std::path::Path;

use crate::error::Result;

/// Operations a workflow needs from a working tree and its remote.
///
/// Implementations are expected to operate on a single working tree. Two
/// concurrent runs against the same tree are not supported.
pub trait VersionControl: Send + Sync {
    /// Root of the working tree.
    fn workdir(&self) -> &Path;

    /// Whether [`workdir`](Self::workdir) is inside a working tree.
    fn is_repository(&self) -> bool;

    /// Whether there are staged, unstaged or untracked changes.
    fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Stashes every change, untracked files included.
    fn stash(&self, message: &str) -> Result<()>;

    /// Branch the remote's `HEAD` points at, without the remote prefix.
    fn remote_default_branch(&self, remote: &str) -> Result<Option<String>>;

    fn local_branch_exists(&self, name: &str) -> Result<bool>;

    /// Checked-out branch, `None` on a detached `HEAD`.
    fn current_branch(&self) -> Result<Option<String>>;

    fn checkout(&self, name: &str) -> Result<()>;

    /// Creates `name` from `from` and checks it out.
    fn create_branch(&self, name: &str, from: &str) -> Result<()>;

    /// URL of `remote`, `None` when it is not configured.
    fn remote_url(&self, remote: &str) -> Result<Option<String>>;

    fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    fn stage_all(&self) -> Result<()>;

    /// Diff of the index against `HEAD`.
    fn staged_diff(&self) -> Result<String>;

    /// Paths with uncommitted changes, relative to the working tree root.
    fn changed_files(&self) -> Result<Vec<String>>;

    /// Commits the index and returns the new commit id.
    fn commit(&self, message: &str) -> Result<String>;

    /// Pushes `branch` and sets its upstream.
    fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Most recent commits on the current branch, one line each.
    fn log(&self, limit: usize) -> Result<Vec<String>>;
}
