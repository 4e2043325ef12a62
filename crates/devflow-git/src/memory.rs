//! In-memory implementation of [`VersionControl`].
//!
//! Models branches, a working tree, an index and a remote closely enough to
//! drive the branch manager and commit composer without a real repository.
//! Every call is recorded so tests can assert on what was (and was not)
//! invoked.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{GitError, Result};
use crate::vcs::VersionControl;

#[derive(Debug, Default)]
struct State {
    is_repository: bool,
    /// Branch name to commit messages, oldest first.
    branches: BTreeMap<String, Vec<String>>,
    current: Option<String>,
    working_tree: Vec<String>,
    index: Vec<String>,
    stashes: Vec<String>,
    remote_url: Option<String>,
    remote_default: Option<String>,
    pushed: Vec<String>,
    fail_pull: bool,
    fail_push: bool,
    calls: Vec<String>,
}

/// Thread-safe fake repository. Clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    workdir: PathBuf,
    state: Arc<Mutex<State>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// A repository on `main` with one commit and no remote.
    pub fn new() -> Self {
        let mut branches = BTreeMap::new();
        branches.insert("main".to_string(), vec!["initial commit".to_string()]);
        Self {
            workdir: PathBuf::from("/repo"),
            state: Arc::new(Mutex::new(State {
                is_repository: true,
                branches,
                current: Some("main".to_string()),
                ..State::default()
            })),
        }
    }

    /// A directory that is not under version control.
    pub fn not_a_repository() -> Self {
        let repo = Self::new();
        repo.state().is_repository = false;
        repo
    }

    /// Replaces the trunk: the repository starts on `name` instead of `main`.
    pub fn with_trunk(self, name: &str) -> Self {
        {
            let mut state = self.state();
            let commits = state.branches.remove("main").unwrap_or_default();
            state.branches.insert(name.to_string(), commits);
            state.current = Some(name.to_string());
        }
        self
    }

    /// Reports `path` as the working directory, so that file contents can
    /// be served from a real directory while history stays in memory.
    pub fn with_workdir(mut self, path: impl Into<PathBuf>) -> Self {
        self.workdir = path.into();
        self
    }

    pub fn with_branch(self, name: &str) -> Self {
        self.state()
            .branches
            .insert(name.to_string(), vec!["initial commit".to_string()]);
        self
    }

    pub fn with_remote(self, url: &str) -> Self {
        self.state().remote_url = Some(url.to_string());
        self
    }

    /// Sets the branch the remote's `HEAD` points at.
    pub fn with_remote_default(self, branch: &str) -> Self {
        self.state().remote_default = Some(branch.to_string());
        self
    }

    pub fn with_uncommitted_file(self, path: &str) -> Self {
        self.write_file(path);
        self
    }

    pub fn failing_pull(self) -> Self {
        self.state().fail_pull = true;
        self
    }

    pub fn failing_push(self) -> Self {
        self.state().fail_push = true;
        self
    }

    /// Simulates a tool writing `path` into the working tree.
    pub fn write_file(&self, path: &str) {
        let mut state = self.state();
        if !state.working_tree.iter().any(|p| p == path) {
            state.working_tree.push(path.to_string());
        }
    }

    /// Every call made so far, in order, as `op` or `op:arg`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of calls to `op`.
    pub fn call_count(&self, op: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    pub fn stashes(&self) -> Vec<String> {
        self.state().stashes.clone()
    }

    /// Branches pushed successfully.
    pub fn pushed(&self) -> Vec<String> {
        self.state().pushed.clone()
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.state().branches.keys().cloned().collect()
    }

    /// Commit messages on `branch`, oldest first.
    pub fn commits(&self, branch: &str) -> Vec<String> {
        self.state().branches.get(branch).cloned().unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: String) -> MutexGuard<'_, State> {
        let mut state = self.state();
        state.calls.push(call);
        state
    }
}

fn failed(command: &str, stderr: impl Into<String>) -> GitError {
    GitError::CommandFailed {
        command: command.to_string(),
        stderr: stderr.into(),
    }
}

impl VersionControl for InMemoryRepository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn is_repository(&self) -> bool {
        self.record("is_repository".into()).is_repository
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let state = self.record("status".into());
        Ok(!state.working_tree.is_empty() || !state.index.is_empty())
    }

    fn stash(&self, message: &str) -> Result<()> {
        let mut state = self.record(format!("stash:{}", message));
        state.working_tree.clear();
        state.index.clear();
        state.stashes.push(message.to_string());
        Ok(())
    }

    fn remote_default_branch(&self, _remote: &str) -> Result<Option<String>> {
        Ok(self.record("remote_default_branch".into()).remote_default.clone())
    }

    fn local_branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .record(format!("local_branch_exists:{}", name))
            .branches
            .contains_key(name))
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.record("current_branch".into()).current.clone())
    }

    fn checkout(&self, name: &str) -> Result<()> {
        let mut state = self.record(format!("checkout:{}", name));
        if !state.branches.contains_key(name) {
            return Err(failed(
                "checkout",
                format!("pathspec '{}' did not match any branch", name),
            ));
        }
        state.current = Some(name.to_string());
        Ok(())
    }

    fn create_branch(&self, name: &str, from: &str) -> Result<()> {
        let mut state = self.record(format!("create_branch:{}", name));
        if state.branches.contains_key(name) {
            return Err(failed(
                "checkout",
                format!("a branch named '{}' already exists", name),
            ));
        }
        let base = state
            .branches
            .get(from)
            .cloned()
            .ok_or_else(|| failed("checkout", format!("'{}' is not a commit", from)))?;
        state.branches.insert(name.to_string(), base);
        state.current = Some(name.to_string());
        Ok(())
    }

    fn remote_url(&self, _remote: &str) -> Result<Option<String>> {
        Ok(self.record("remote_url".into()).remote_url.clone())
    }

    fn pull(&self, _remote: &str, branch: &str) -> Result<()> {
        let state = self.record(format!("pull:{}", branch));
        if state.fail_pull {
            return Err(failed("pull", "could not read from remote repository"));
        }
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        let mut state = self.record("stage_all".into());
        let pending = std::mem::take(&mut state.working_tree);
        for path in pending {
            if !state.index.contains(&path) {
                state.index.push(path);
            }
        }
        Ok(())
    }

    fn staged_diff(&self) -> Result<String> {
        let state = self.record("staged_diff".into());
        Ok(state
            .index
            .iter()
            .map(|p| format!("diff --git a/{p} b/{p}\n+++ b/{p}\n"))
            .collect())
    }

    fn changed_files(&self) -> Result<Vec<String>> {
        let state = self.record("changed_files".into());
        let mut files = state.index.clone();
        files.extend(state.working_tree.iter().cloned());
        Ok(files)
    }

    fn commit(&self, message: &str) -> Result<String> {
        let mut state = self.record("commit".into());
        if state.index.is_empty() {
            return Err(failed("commit", "nothing to commit, working tree clean"));
        }
        let current = state
            .current
            .clone()
            .ok_or_else(|| failed("commit", "HEAD is detached"))?;
        state.index.clear();
        let commits = state.branches.entry(current).or_default();
        commits.push(message.to_string());
        Ok(format!("{:040x}", commits.len()))
    }

    fn push(&self, _remote: &str, branch: &str) -> Result<()> {
        let mut state = self.record(format!("push:{}", branch));
        if state.remote_url.is_none() {
            return Err(failed("push", "no remote configured"));
        }
        if state.fail_push {
            return Err(failed("push", "permission denied"));
        }
        state.pushed.push(branch.to_string());
        Ok(())
    }

    fn log(&self, limit: usize) -> Result<Vec<String>> {
        let state = self.record("log".into());
        let commits = state
            .current
            .as_ref()
            .and_then(|b| state.branches.get(b))
            .cloned()
            .unwrap_or_default();
        Ok(commits.into_iter().rev().take(limit).collect())
    }
}
