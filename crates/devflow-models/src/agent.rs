//! Agent invocation types.
//!
//! An invocation names a role, the tools to try, and the payload. Its
//! result keeps every attempt so that a failed fallback chain can be
//! reported in full.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Role an agent plays in a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Turns a task and context into source files.
    Coder,
    /// Turns source text into a review or report.
    Reviewer,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Coder => "coder",
            AgentRole::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an agent may change files in the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    ReadOnly,
    Edit,
}

impl AgentRole {
    /// Coders edit the working tree, reviewers only read it.
    pub fn default_access(&self) -> Access {
        match self {
            AgentRole::Coder => Access::Edit,
            AgentRole::Reviewer => Access::ReadOnly,
        }
    }
}

/// A request to run an agent with an optional fallback tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInvocation {
    pub role: AgentRole,
    /// Adapter id tried first.
    pub primary_tool: String,
    /// Adapter id tried once if the primary fails.
    pub fallback_tool: Option<String>,
    pub payload: String,
    /// Per-attempt timeout; the fallback gets a fresh one.
    pub timeout: Duration,
    /// Defaults to the role's [`AgentRole::default_access`].
    pub access: Access,
}

impl AgentInvocation {
    pub fn new(
        role: AgentRole,
        primary_tool: impl Into<String>,
        payload: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            role,
            primary_tool: primary_tool.into(),
            fallback_tool: None,
            payload: payload.into(),
            timeout,
            access: role.default_access(),
        }
    }

    /// Sets the fallback tool.
    pub fn with_fallback(mut self, fallback: Option<impl Into<String>>) -> Self {
        self.fallback_tool = fallback.map(Into::into);
        self
    }

    /// Runs the agent without permission to edit files, whatever its role.
    pub fn read_only(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }
}

/// Captured output of a finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// How one attempt against one tool ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The process ran to completion (with any exit status).
    Completed(ProcessOutput),
    /// The tool could not be located.
    Unavailable { reason: String },
    /// The tool was found but could not be started or talked to.
    LaunchFailed { message: String },
    /// The tool exceeded its timeout and was killed.
    TimedOut { timeout_secs: u64 },
}

/// A single attempt against a single tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAttempt {
    pub tool: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl AgentAttempt {
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, AttemptOutcome::Completed(output) if output.success())
    }

    /// One-line description of why the attempt failed.
    pub fn failure_reason(&self) -> Option<String> {
        match &self.outcome {
            AttemptOutcome::Completed(output) if output.success() => None,
            AttemptOutcome::Completed(output) => {
                let code = output
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let detail = output.stderr.trim();
                if detail.is_empty() {
                    Some(format!("{} exited with status {}", self.tool, code))
                } else {
                    Some(format!(
                        "{} exited with status {}: {}",
                        self.tool,
                        code,
                        first_line(detail)
                    ))
                }
            }
            AttemptOutcome::Unavailable { reason } => {
                Some(format!("{} unavailable: {}", self.tool, reason))
            }
            AttemptOutcome::LaunchFailed { message } => {
                Some(format!("{} failed to launch: {}", self.tool, message))
            }
            AttemptOutcome::TimedOut { timeout_secs } => {
                Some(format!("{} timed out after {}s", self.tool, timeout_secs))
            }
        }
    }
}

/// Result of an agent invocation, including the fallback if one ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    pub role: AgentRole,
    /// Attempts in the order they ran (at most two).
    pub attempts: Vec<AgentAttempt>,
    /// Result file written on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl AgentResult {
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            attempts: Vec::new(),
            output_path: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.successful_attempt().is_some()
    }

    pub fn successful_attempt(&self) -> Option<&AgentAttempt> {
        self.attempts.iter().find(|a| a.succeeded())
    }

    /// Tool that produced the successful output.
    pub fn tool_used(&self) -> Option<&str> {
        self.successful_attempt().map(|a| a.tool.as_str())
    }

    /// Stdout of the successful attempt.
    pub fn stdout(&self) -> Option<&str> {
        match self.successful_attempt().map(|a| &a.outcome) {
            Some(AttemptOutcome::Completed(output)) => Some(output.stdout.as_str()),
            _ => None,
        }
    }

    /// Failure reasons of every failed attempt, joined with `; `.
    pub fn failure_summary(&self) -> String {
        let reasons: Vec<String> = self
            .attempts
            .iter()
            .filter_map(AgentAttempt::failure_reason)
            .collect();
        if reasons.is_empty() {
            "no agent attempted".to_string()
        } else {
            reasons.join("; ")
        }
    }

    pub fn summary(&self) -> InvocationSummary {
        InvocationSummary {
            role: self.role,
            tools_tried: self.attempts.iter().map(|a| a.tool.clone()).collect(),
            tool_used: self.tool_used().map(str::to_string),
            succeeded: self.succeeded(),
            output_path: self.output_path.clone(),
        }
    }
}

/// Condensed invocation record kept in a workflow record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationSummary {
    pub role: AgentRole,
    pub tools_tried: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}
