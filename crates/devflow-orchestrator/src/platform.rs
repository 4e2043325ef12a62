//! Hosting platform detection and merge request creation.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use devflow_adapters::{run_with_stdin, ExecError};
use tracing::debug;

use crate::error::MergeRequestError;

/// Where the remote is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    GitHub,
    GitLab,
    /// Anything else; merge requests are left to the user.
    Manual,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::GitHub => "GitHub",
            Platform::GitLab => "GitLab",
            Platform::Manual => "unknown platform",
        })
    }
}

/// Picks the platform from a remote URL by host substring.
pub fn detect_platform(remote_url: &str) -> Platform {
    let url = remote_url.to_ascii_lowercase();
    if url.contains("github.com") {
        Platform::GitHub
    } else if url.contains("gitlab") {
        Platform::GitLab
    } else {
        Platform::Manual
    }
}

/// A merge request to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub title: String,
    pub description: String,
    pub source_branch: String,
    pub target_branch: String,
}

impl MergeRequest {
    /// Instructions for opening the request by hand.
    pub fn manual_instructions(&self) -> String {
        let description: String = self
            .description
            .lines()
            .map(|line| format!("    {}\n", line))
            .collect();
        format!(
            "Open a merge request manually:\n  source branch: {}\n  target branch: {}\n  title: {}\n  description:\n{}",
            self.source_branch, self.target_branch, self.title, description
        )
    }
}

/// Opens merge requests on a hosting platform.
#[async_trait]
pub trait MergeRequestClient: Send + Sync {
    /// Opens `request` and returns its URL.
    async fn create(
        &self,
        platform: Platform,
        request: &MergeRequest,
        workdir: &Path,
        timeout: Duration,
    ) -> Result<String, MergeRequestError>;
}

/// [`MergeRequestClient`] over the `gh` and `glab` command lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformCli;

impl PlatformCli {
    fn command_line(platform: Platform, request: &MergeRequest) -> Option<(&'static str, Vec<String>)> {
        let owned = |args: &[&str]| args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        match platform {
            Platform::GitHub => Some((
                "gh",
                owned(&[
                    "pr",
                    "create",
                    "--title",
                    request.title.as_str(),
                    "--body",
                    request.description.as_str(),
                    "--head",
                    request.source_branch.as_str(),
                    "--base",
                    request.target_branch.as_str(),
                ]),
            )),
            Platform::GitLab => Some((
                "glab",
                owned(&[
                    "mr",
                    "create",
                    "--title",
                    request.title.as_str(),
                    "--description",
                    request.description.as_str(),
                    "--source-branch",
                    request.source_branch.as_str(),
                    "--target-branch",
                    request.target_branch.as_str(),
                    "--yes",
                ]),
            )),
            Platform::Manual => None,
        }
    }
}

#[async_trait]
impl MergeRequestClient for PlatformCli {
    async fn create(
        &self,
        platform: Platform,
        request: &MergeRequest,
        workdir: &Path,
        timeout: Duration,
    ) -> Result<String, MergeRequestError> {
        let (program, args) =
            Self::command_line(platform, request).ok_or(MergeRequestError::UnsupportedPlatform)?;
        let path = which::which(program)
            .map_err(|_| MergeRequestError::CliUnavailable(program.to_string()))?;

        debug!(program = %program, source = %request.source_branch, target = %request.target_branch, "creating merge request");
        let output = run_with_stdin(&path, &args, workdir, "", timeout)
            .await
            .map_err(|e| match e {
                ExecError::TimedOut { timeout, .. } => MergeRequestError::TimedOut(timeout.as_secs()),
                other => MergeRequestError::Failed(other.to_string()),
            })?;

        if !output.success() {
            let stderr = output.stderr.trim();
            let reason = stderr.lines().next().unwrap_or("no error output");
            return Err(MergeRequestError::Failed(reason.to_string()));
        }

        // Both CLIs print the new request's URL as their last line.
        let url = output
            .stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| line.starts_with("http"))
            .unwrap_or_else(|| output.stdout.trim());
        Ok(url.to_string())
    }
}
