//! Commit composition against an in-memory repository.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingMergeRequests, Reply, ScriptedProvider, ScriptedTool};
use devflow_git::{InMemoryRepository, VersionControl};
use devflow_models::{feature_branch_name, Access, AgentRole, BranchState, Task, TaskKind};
use devflow_orchestrator::{
    AgentDispatcher, CommitComposer, CommitFailure, CommitOutcome, ComposerSettings,
    MergeRequestError, MergeRequestStatus, MessageConfirmer, MessageSource, Platform, PushStatus,
};

fn settings() -> ComposerSettings {
    ComposerSettings {
        remote: "origin".into(),
        coder_tool: "claude-code".into(),
        reviewer_tool: "gemini".into(),
        coder_timeout: Duration::from_secs(5),
        reviewer_timeout: Duration::from_secs(5),
        platform_timeout: Duration::from_secs(5),
    }
}

fn branch() -> BranchState {
    BranchState {
        trunk_name: "main".into(),
        feature_branch_name: feature_branch_name("search"),
        is_clean: true,
        exists_locally: true,
        stashed: false,
        resumed: false,
        pull_error: None,
    }
}

fn task() -> Task {
    Task::new("search", TaskKind::FeatureText, "search", "rust")
}

/// A repository on `feature/search` with one changed file.
fn repo_with_change(remote: Option<&str>) -> InMemoryRepository {
    let mut repo = InMemoryRepository::new().with_branch("feature/search");
    if let Some(url) = remote {
        repo = repo.with_remote(url);
    }
    repo.checkout("feature/search").unwrap();
    repo.write_file("src/search.rs");
    repo
}

fn composer(
    repo: &InMemoryRepository,
    provider: ScriptedProvider,
    mrs: Arc<RecordingMergeRequests>,
) -> CommitComposer {
    let dispatcher = Arc::new(AgentDispatcher::new(Arc::new(provider), "/repo"));
    CommitComposer::new(Arc::new(repo.clone()), dispatcher, settings()).with_merge_requests(mrs)
}

#[tokio::test]
async fn test_empty_diff_asks_no_agent() {
    let repo = InMemoryRepository::new().with_branch("feature/search");
    let coder = ScriptedTool::new("claude-code", vec![Reply::ok("feat: x")]);
    let mrs = RecordingMergeRequests::succeeding("unused");

    let finalized = composer(&repo, ScriptedProvider::new().with_tool(coder.clone()), mrs)
        .finalize(&branch(), &task(), &[])
        .await;

    assert_eq!(
        finalized.outcome,
        CommitOutcome::Failed(CommitFailure::NoChanges)
    );
    assert!(finalized.agent_results.is_empty());
    assert_eq!(coder.calls(), 0);
    assert_eq!(repo.call_count("commit"), 0);
}

#[tokio::test]
async fn test_reviewer_writes_message_when_coder_cannot() {
    let repo = repo_with_change(Some("git@github.com:acme/app.git"));
    let coder = ScriptedTool::new("claude-code", vec![Reply::ok("   ")]);
    let reviewer = ScriptedTool::new("gemini", vec![Reply::ok("```\nfeat: add search\n```")]);
    let provider = ScriptedProvider::new()
        .with_tool(coder.clone())
        .with_tool(reviewer.clone());
    let mrs = RecordingMergeRequests::succeeding("https://github.com/acme/app/pull/9");

    let finalized = composer(&repo, provider, mrs)
        .finalize(&branch(), &task(), &["Solid.".to_string()])
        .await;

    match finalized.outcome {
        CommitOutcome::Committed {
            message, source, ..
        } => {
            assert_eq!(message, "feat: add search");
            assert_eq!(
                source,
                MessageSource::Agent {
                    role: AgentRole::Reviewer,
                    tool: "gemini".into()
                }
            );
        }
        other => panic!("expected a commit, got {other:?}"),
    }
    assert_eq!(finalized.agent_results.len(), 2);
    assert!(coder.payloads()[0].1.contains("- Solid."));
}

#[tokio::test]
async fn test_message_agents_cannot_edit_staged_tree() {
    let repo = repo_with_change(Some("git@github.com:acme/app.git"));
    let coder = ScriptedTool::new("claude-code", vec![Reply::Exit(1, "busy".into())]);
    let reviewer = ScriptedTool::new("gemini", vec![Reply::ok("feat: add search")]);
    let provider = ScriptedProvider::new()
        .with_tool(coder.clone())
        .with_tool(reviewer.clone());
    let mrs = RecordingMergeRequests::succeeding("https://github.com/acme/app/pull/12");

    composer(&repo, provider, mrs)
        .finalize(&branch(), &task(), &[])
        .await;

    assert_eq!(coder.payloads()[0].0, AgentRole::Coder);
    assert_eq!(coder.accesses(), vec![Access::ReadOnly]);
    assert_eq!(reviewer.accesses(), vec![Access::ReadOnly]);
}

#[tokio::test]
async fn test_template_message_when_no_agent_answers() {
    let repo = repo_with_change(Some("git@github.com:acme/app.git"));
    let mrs = RecordingMergeRequests::succeeding("https://github.com/acme/app/pull/10");

    let finalized = composer(&repo, ScriptedProvider::new(), mrs)
        .finalize(&branch(), &task(), &[])
        .await;

    match finalized.outcome {
        CommitOutcome::Committed {
            message, source, ..
        } => {
            assert_eq!(message, "feat: implement search");
            assert_eq!(source, MessageSource::Template);
        }
        other => panic!("expected a commit, got {other:?}"),
    }
    // No fallbacks during message synthesis: one attempt per role.
    assert!(finalized
        .agent_results
        .iter()
        .all(|r| r.attempts.len() == 1));
    assert_eq!(repo.commits("feature/search").last().unwrap(), "feat: implement search");
}

struct Rewrite;

impl MessageConfirmer for Rewrite {
    fn confirm(&self, _proposed: &str) -> String {
        "fix: edited by hand\n".to_string()
    }
}

#[tokio::test]
async fn test_confirmer_has_the_last_word() {
    let repo = repo_with_change(Some("git@github.com:acme/app.git"));
    let coder = ScriptedTool::new("claude-code", vec![Reply::ok("feat: proposed")]);
    let mrs = RecordingMergeRequests::succeeding("https://github.com/acme/app/pull/11");

    let finalized = composer(&repo, ScriptedProvider::new().with_tool(coder), mrs.clone())
        .with_confirmer(Arc::new(Rewrite))
        .finalize(&branch(), &task(), &[])
        .await;

    match finalized.outcome {
        CommitOutcome::Committed { message, .. } => assert_eq!(message, "fix: edited by hand"),
        other => panic!("expected a commit, got {other:?}"),
    }
    assert_eq!(mrs.requests()[0].1.title, "fix: edited by hand");
}

#[tokio::test]
async fn test_missing_remote_keeps_commit_local() {
    let repo = repo_with_change(None);
    let coder = ScriptedTool::new("claude-code", vec![Reply::ok("feat: local")]);
    let mrs = RecordingMergeRequests::succeeding("unused");

    let finalized = composer(&repo, ScriptedProvider::new().with_tool(coder), mrs.clone())
        .finalize(&branch(), &task(), &[])
        .await;

    match finalized.outcome {
        CommitOutcome::Committed {
            push,
            merge_request,
            ..
        } => {
            assert_eq!(
                push,
                PushStatus::Failed {
                    reason: "remote 'origin' is not configured".into()
                }
            );
            assert_eq!(merge_request, MergeRequestStatus::Skipped);
        }
        other => panic!("expected a commit, got {other:?}"),
    }
    assert_eq!(repo.call_count("push"), 0);
    assert!(mrs.requests().is_empty());
}

#[tokio::test]
async fn test_platform_timeout_degrades_to_manual() {
    let repo = repo_with_change(Some("https://gitlab.example.com/team/app.git"));
    let coder = ScriptedTool::new("claude-code", vec![Reply::ok("feat: search")]);
    let mrs = RecordingMergeRequests::failing(MergeRequestError::TimedOut(60));

    let finalized = composer(&repo, ScriptedProvider::new().with_tool(coder), mrs.clone())
        .finalize(&branch(), &task(), &[])
        .await;

    match finalized.outcome {
        CommitOutcome::Committed {
            push,
            merge_request,
            ..
        } => {
            assert_eq!(push, PushStatus::Pushed { remote: "origin".into() });
            match merge_request {
                MergeRequestStatus::Manual {
                    platform,
                    reason,
                    instructions,
                } => {
                    assert_eq!(platform, Platform::GitLab);
                    assert!(reason.contains("timed out"));
                    assert!(instructions.contains("target branch: main"));
                }
                other => panic!("expected manual merge request, got {other:?}"),
            }
        }
        other => panic!("expected a commit, got {other:?}"),
    }
    let (_, request) = &mrs.requests()[0];
    assert_eq!(request.source_branch, "feature/search");
    assert!(request.description.contains("Generated from feature-text input: search"));
}
