//! [`VersionControl`] backed by the `git` command line.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, trace};

use crate::error::{GitError, Result};
use crate::vcs::VersionControl;

/// Runs `git -C <workdir> ...` for every operation.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Check if git is available in PATH.
    pub fn is_available() -> bool {
        which::which("git").is_ok()
    }

    /// Run a git command and return the output.
    fn run_git(&self, args: &[&str]) -> Result<Output> {
        trace!(args = ?args, workdir = %self.workdir.display(), "running git command");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.workdir)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;
        trace!(
            status = %output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "git command completed"
        );
        Ok(output)
    }

    /// Run a git command and check for success.
    fn run_git_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run_git(args)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(GitError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Run a git command whose exit status is the answer.
    fn run_git_status(&self, args: &[&str]) -> Result<bool> {
        Ok(self.run_git(args)?.status.success())
    }

    fn porcelain_status(&self) -> Result<String> {
        self.run_git_checked(&["status", "--porcelain"])
    }
}

/// Extracts paths from `git status --porcelain -z` output.
///
/// Records are NUL-terminated and paths are unquoted. A rename or copy is
/// followed by an extra record holding the source path, which is skipped.
fn parse_porcelain(output: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut records = output.split('\0');
    while let Some(record) = records.next() {
        if record.len() < 4 {
            continue;
        }
        let (status, path) = record.split_at(3);
        if status.contains(['R', 'C']) {
            records.next();
        }
        paths.push(path.to_string());
    }
    paths
}

impl VersionControl for GitCli {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn is_repository(&self) -> bool {
        self.run_git_checked(&["rev-parse", "--is-inside-work-tree"])
            .map(|out| out.trim() == "true")
            .unwrap_or(false)
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(!self.porcelain_status()?.trim().is_empty())
    }

    fn stash(&self, message: &str) -> Result<()> {
        debug!(message = %message, "stashing working tree changes");
        self.run_git_checked(&["stash", "push", "--include-untracked", "-m", message])?;
        Ok(())
    }

    fn remote_default_branch(&self, remote: &str) -> Result<Option<String>> {
        let head_ref = format!("refs/remotes/{}/HEAD", remote);
        let output = self.run_git(&["symbolic-ref", "--short", &head_ref])?;
        if !output.status.success() {
            return Ok(None);
        }
        let full = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let prefix = format!("{}/", remote);
        let branch = full.strip_prefix(&prefix).unwrap_or(&full).to_string();
        Ok((!branch.is_empty()).then_some(branch))
    }

    fn local_branch_exists(&self, name: &str) -> Result<bool> {
        let full = format!("refs/heads/{}", name);
        self.run_git_status(&["show-ref", "--verify", "--quiet", &full])
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let output = self.run_git(&["symbolic-ref", "--short", "-q", "HEAD"])?;
        if !output.status.success() {
            return Ok(None);
        }
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!name.is_empty()).then_some(name))
    }

    fn checkout(&self, name: &str) -> Result<()> {
        debug!(branch = %name, "checking out branch");
        self.run_git_checked(&["checkout", name])?;
        Ok(())
    }

    fn create_branch(&self, name: &str, from: &str) -> Result<()> {
        debug!(branch = %name, from = %from, "creating branch");
        self.run_git_checked(&["checkout", "-b", name, from])?;
        Ok(())
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        let output = self.run_git(&["remote", "get-url", remote])?;
        if !output.status.success() {
            return Ok(None);
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!url.is_empty()).then_some(url))
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        debug!(remote = %remote, branch = %branch, "pulling");
        self.run_git_checked(&["pull", "--ff-only", remote, branch])?;
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        self.run_git_checked(&["add", "-A"])?;
        Ok(())
    }

    fn staged_diff(&self) -> Result<String> {
        self.run_git_checked(&["diff", "--cached"])
    }

    fn changed_files(&self) -> Result<Vec<String>> {
        let out =
            self.run_git_checked(&["status", "--porcelain", "-z", "--untracked-files=all"])?;
        Ok(parse_porcelain(&out))
    }

    fn commit(&self, message: &str) -> Result<String> {
        self.run_git_checked(&["commit", "-m", message])?;
        let sha = self.run_git_checked(&["rev-parse", "HEAD"])?;
        Ok(sha.trim().to_string())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        debug!(remote = %remote, branch = %branch, "pushing");
        self.run_git_checked(&["push", "-u", remote, branch])?;
        Ok(())
    }

    fn log(&self, limit: usize) -> Result<Vec<String>> {
        let count = limit.to_string();
        let out = self.run_git_checked(&["log", "--oneline", "-n", &count])?;
        Ok(out.lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_porcelain() {
        let output = " M src/lib.rs\0?? notes.md\0R  new.rs\0old.rs\0A  with space.rs\0?? caf\u{e9}.py\0";
        assert_eq!(
            parse_porcelain(output),
            vec!["src/lib.rs", "notes.md", "new.rs", "with space.rs", "caf\u{e9}.py"]
        );
    }

    #[test]
    fn test_parse_porcelain_empty() {
        assert!(parse_porcelain("").is_empty());
    }

    #[test]
    fn test_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(dir.path());
        assert!(!git.is_repository());
    }
}
