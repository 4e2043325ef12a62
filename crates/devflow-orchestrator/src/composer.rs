//! Commit composition.
//!
//! Stages the feature branch, synthesizes a commit message, commits, pushes
//! and asks the hosting platform for a merge request. Only staging and the
//! commit itself can end the sequence early; everything after the commit
//! degrades instead of failing.

use std::sync::Arc;
use std::time::Duration;

use devflow_core::WorkflowConfig;
use devflow_git::VersionControl;
use devflow_models::{AgentInvocation, AgentResult, AgentRole, BranchState, Task};
use tracing::{debug, info, warn};

use crate::confirm::{AutoAccept, MessageConfirmer};
use crate::dispatcher::AgentDispatcher;
use crate::platform::{detect_platform, MergeRequest, MergeRequestClient, Platform, PlatformCli};
use crate::prompts;

/// Where the committed message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource {
    Agent { role: AgentRole, tool: String },
    Template,
}

/// Why nothing was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitFailure {
    /// The staged diff was empty.
    NoChanges,
    /// Staging or committing failed.
    Vcs(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    Pushed { remote: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeRequestStatus {
    Created { platform: Platform, url: String },
    /// Needs to be opened by hand; `instructions` says how.
    Manual {
        platform: Platform,
        reason: String,
        instructions: String,
    },
    /// Not attempted because the push failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed {
        sha: String,
        message: String,
        source: MessageSource,
        push: PushStatus,
        merge_request: MergeRequestStatus,
    },
    Failed(CommitFailure),
}

/// Outcome plus the agent calls made to write the message.
#[derive(Debug, Clone)]
pub struct Finalized {
    pub outcome: CommitOutcome,
    pub agent_results: Vec<AgentResult>,
}

/// Settings the composer takes from the workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerSettings {
    pub remote: String,
    pub coder_tool: String,
    pub reviewer_tool: String,
    pub coder_timeout: Duration,
    pub reviewer_timeout: Duration,
    pub platform_timeout: Duration,
}

impl ComposerSettings {
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            remote: config.remote.clone(),
            coder_tool: config.coder.primary.clone(),
            reviewer_tool: config.reviewer.primary.clone(),
            coder_timeout: config.timeouts.coder,
            reviewer_timeout: config.timeouts.reviewer,
            platform_timeout: config.timeouts.platform,
        }
    }
}

/// Turns a prepared feature branch into a commit, a push and a merge request.
pub struct CommitComposer {
    vcs: Arc<dyn VersionControl>,
    dispatcher: Arc<AgentDispatcher>,
    merge_requests: Arc<dyn MergeRequestClient>,
    confirmer: Arc<dyn MessageConfirmer>,
    settings: ComposerSettings,
}

/// Deterministic message used when no agent produces one.
pub fn template_message(branch: &BranchState) -> String {
    format!("feat: implement {}", branch.feature_suffix())
}

/// Strips code fences and surrounding quotes an agent may wrap a message in.
fn clean_message(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .trim()
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();
    let message = lines.join("\n");
    let message = message.trim().trim_matches(|c: char| c == '"' || c == '`').trim();
    (!message.is_empty()).then(|| message.to_string())
}

impl CommitComposer {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        dispatcher: Arc<AgentDispatcher>,
        settings: ComposerSettings,
    ) -> Self {
        Self {
            vcs,
            dispatcher,
            merge_requests: Arc::new(PlatformCli),
            confirmer: Arc::new(AutoAccept),
            settings,
        }
    }

    pub fn with_merge_requests(mut self, client: Arc<dyn MergeRequestClient>) -> Self {
        self.merge_requests = client;
        self
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn MessageConfirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    /// Commits everything in the working tree on the feature branch.
    ///
    /// An empty staged diff ends with [`CommitFailure::NoChanges`] before any
    /// agent is asked for a message. Nothing is pushed unless the commit
    /// succeeds, and no merge request is attempted unless the push does.
    pub async fn finalize(&self, branch: &BranchState, task: &Task, reviews: &[String]) -> Finalized {
        let mut agent_results = Vec::new();
        let outcome = self
            .finalize_inner(branch, task, reviews, &mut agent_results)
            .await;
        Finalized {
            outcome,
            agent_results,
        }
    }

    async fn finalize_inner(
        &self,
        branch: &BranchState,
        task: &Task,
        reviews: &[String],
        agent_results: &mut Vec<AgentResult>,
    ) -> CommitOutcome {
        if let Err(e) = self.vcs.stage_all() {
            return CommitOutcome::Failed(CommitFailure::Vcs(e.to_string()));
        }
        let diff = match self.vcs.staged_diff() {
            Ok(diff) => diff,
            Err(e) => return CommitOutcome::Failed(CommitFailure::Vcs(e.to_string())),
        };
        if diff.trim().is_empty() {
            info!(branch = %branch.feature_branch_name, "nothing staged, skipping commit");
            return CommitOutcome::Failed(CommitFailure::NoChanges);
        }

        let (proposed, source) = self.synthesize_message(branch, &diff, reviews, agent_results).await;
        let confirmed = self.confirmer.confirm(&proposed);
        let message = if confirmed.trim().is_empty() {
            proposed
        } else {
            confirmed.trim().to_string()
        };

        let sha = match self.vcs.commit(&message) {
            Ok(sha) => sha,
            Err(e) => {
                warn!(error = %e, "commit failed, not pushing");
                return CommitOutcome::Failed(CommitFailure::Vcs(e.to_string()));
            }
        };
        info!(sha = %sha, message = %first_line(&message), "committed");

        let (push, remote_url) = self.push(branch);
        let merge_request = match (&push, remote_url) {
            (PushStatus::Pushed { .. }, Some(url)) => {
                self.open_merge_request(&url, branch, task, &message, reviews)
                    .await
            }
            _ => MergeRequestStatus::Skipped,
        };

        CommitOutcome::Committed {
            sha,
            message,
            source,
            push,
            merge_request,
        }
    }

    /// Coder first, then Reviewer, each without fallback, then the template.
    ///
    /// Changes are already staged, so neither agent may edit files here.
    async fn synthesize_message(
        &self,
        branch: &BranchState,
        diff: &str,
        reviews: &[String],
        agent_results: &mut Vec<AgentResult>,
    ) -> (String, MessageSource) {
        let prompt = prompts::commit_message(diff, reviews);
        let candidates = [
            (AgentRole::Coder, &self.settings.coder_tool, self.settings.coder_timeout),
            (AgentRole::Reviewer, &self.settings.reviewer_tool, self.settings.reviewer_timeout),
        ];

        for (role, tool, timeout) in candidates {
            let invocation =
                AgentInvocation::new(role, tool.as_str(), prompt.as_str(), timeout).read_only();
            let result = self.dispatcher.invoke(&invocation).await;
            let message = result.stdout().and_then(clean_message);
            let used = result.tool_used().map(str::to_string);
            agent_results.push(result);

            if let (Some(message), Some(tool)) = (message, used) {
                debug!(role = %role, tool = %tool, "commit message from agent");
                return (message, MessageSource::Agent { role, tool });
            }
            debug!(role = %role, "no usable commit message from agent");
        }

        let message = template_message(branch);
        info!(message = %message, "using template commit message");
        (message, MessageSource::Template)
    }

    /// Pushes the feature branch. Returns the status and the remote URL.
    fn push(&self, branch: &BranchState) -> (PushStatus, Option<String>) {
        let remote = &self.settings.remote;
        let url = match self.vcs.remote_url(remote) {
            Ok(Some(url)) => url,
            Ok(None) => {
                let reason = format!("remote '{}' is not configured", remote);
                warn!(%reason, "push skipped");
                return (PushStatus::Failed { reason }, None);
            }
            Err(e) => return (PushStatus::Failed { reason: e.to_string() }, None),
        };

        match self.vcs.push(remote, &branch.feature_branch_name) {
            Ok(()) => {
                info!(remote = %remote, branch = %branch.feature_branch_name, "pushed");
                (PushStatus::Pushed { remote: remote.clone() }, Some(url))
            }
            Err(e) => {
                warn!(remote = %remote, error = %e, "push failed, commit kept locally");
                (PushStatus::Failed { reason: e.to_string() }, Some(url))
            }
        }
    }

    async fn open_merge_request(
        &self,
        remote_url: &str,
        branch: &BranchState,
        task: &Task,
        message: &str,
        reviews: &[String],
    ) -> MergeRequestStatus {
        let request = MergeRequest {
            title: first_line(message).to_string(),
            description: describe(task, message, reviews),
            source_branch: branch.feature_branch_name.clone(),
            target_branch: branch.trunk_name.clone(),
        };

        let platform = detect_platform(remote_url);
        if platform == Platform::Manual {
            return MergeRequestStatus::Manual {
                platform,
                reason: format!("no merge request support for {}", remote_url),
                instructions: request.manual_instructions(),
            };
        }

        match self
            .merge_requests
            .create(
                platform,
                &request,
                self.vcs.workdir(),
                self.settings.platform_timeout,
            )
            .await
        {
            Ok(url) => {
                info!(%platform, url = %url, "merge request created");
                MergeRequestStatus::Created { platform, url }
            }
            Err(e) => {
                warn!(%platform, error = %e, "merge request not created");
                MergeRequestStatus::Manual {
                    platform,
                    reason: e.to_string(),
                    instructions: request.manual_instructions(),
                }
            }
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}

fn describe(task: &Task, message: &str, reviews: &[String]) -> String {
    let mut description = format!("Generated from {} input: {}\n", task.kind(), task.raw_input());
    let body: Vec<&str> = message.lines().skip(1).filter(|l| !l.trim().is_empty()).collect();
    if !body.is_empty() {
        description.push('\n');
        description.push_str(&body.join("\n"));
        description.push('\n');
    }
    if !reviews.is_empty() {
        description.push_str(&format!("\nAutomated review completed ({} report(s)).\n", reviews.len()));
    }
    description
}
