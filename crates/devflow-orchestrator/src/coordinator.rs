//! Workflow coordination.
//!
//! A run moves through a fixed sequence of phases:
//!
//! ```text
//! Init -> Classifying -> BranchReady -> Dispatching -> Finalizing -> Completed
//!              \               \              \
//!               +---------------+--------------+--> Failed
//! ```
//!
//! Only classification, branch preparation and a mandatory agent can stop a
//! run. Everything after that is recorded as a degraded step and the run
//! carries on. The record is written whatever the outcome.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use devflow_adapters::CapabilityProvider;
use devflow_core::{
    collect_source_files, expand_path, language_for_extension, Classifier, ContextExtractor,
    HttpFetcher, RemoteFetcher, ReviewFocus, WorkflowConfig,
};
use devflow_git::{BranchManager, VersionControl};
use devflow_models::{
    truncate_context, AgentInvocation, AgentResult, AgentRole, BranchState, InvocationSummary,
    RunId, StepOutcome, Task, TaskKind, WorkflowRecord, WorkflowStatus, WorkflowStep, WorkflowType,
};
use devflow_persistence::atomic::atomic_create;
use devflow_persistence::{OutputStore, RecordStore};
use tracing::{debug, info, warn};

use crate::composer::{
    CommitComposer, CommitFailure, CommitOutcome, ComposerSettings, MergeRequestStatus,
    MessageSource, PushStatus,
};
use crate::confirm::{AutoAccept, MessageConfirmer};
use crate::dispatcher::AgentDispatcher;
use crate::error::WorkflowError;
use crate::platform::{MergeRequestClient, PlatformCli};
use crate::prompts;
use crate::report::{RunOutcome, WorkflowReport};
use crate::testgen;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Init,
    Classifying,
    BranchReady,
    Dispatching,
    Finalizing,
    Completed,
    Failed,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkflowPhase::Init => "init",
            WorkflowPhase::Classifying => "classifying",
            WorkflowPhase::BranchReady => "branch-ready",
            WorkflowPhase::Dispatching => "dispatching",
            WorkflowPhase::Finalizing => "finalizing",
            WorkflowPhase::Completed => "completed",
            WorkflowPhase::Failed => "failed",
        })
    }
}

/// Mutable state of a single run.
struct Run {
    id: RunId,
    workflow_type: WorkflowType,
    phase: WorkflowPhase,
    task: Option<Task>,
    branch: Option<String>,
    steps: Vec<WorkflowStep>,
    invocations: Vec<InvocationSummary>,
    manual_actions: Vec<String>,
}

impl Run {
    fn new(workflow_type: WorkflowType) -> Self {
        Self {
            id: RunId::new(),
            workflow_type,
            phase: WorkflowPhase::Init,
            task: None,
            branch: None,
            steps: Vec::new(),
            invocations: Vec::new(),
            manual_actions: Vec::new(),
        }
    }

    fn transition(&mut self, to: WorkflowPhase) {
        debug!(run = %self.id.short(), from = %self.phase, to = %to, "workflow phase");
        self.phase = to;
    }

    fn step(&mut self, name: impl Into<String>, outcome: StepOutcome, message: impl Into<String>) {
        let step = WorkflowStep::new(name, outcome, message);
        match outcome {
            StepOutcome::Succeeded | StepOutcome::Skipped => {
                debug!(step = %step.name, outcome = outcome.marker(), "{}", step.message)
            }
            StepOutcome::Degraded | StepOutcome::Failed => {
                warn!(step = %step.name, outcome = outcome.marker(), "{}", step.message)
            }
        }
        self.steps.push(step);
    }

    fn record_agent(&mut self, result: &AgentResult) {
        self.invocations.push(result.summary());
    }
}

/// Runs feature, integration and audit workflows against one repository.
pub struct WorkflowCoordinator {
    config: WorkflowConfig,
    vcs: Arc<dyn VersionControl>,
    provider: Arc<dyn CapabilityProvider>,
    fetcher: Arc<dyn RemoteFetcher>,
    merge_requests: Arc<dyn MergeRequestClient>,
    confirmer: Arc<dyn MessageConfirmer>,
}

impl WorkflowCoordinator {
    /// Creates a coordinator with an HTTP fetcher, the `gh`/`glab` merge
    /// request client and auto-accepted commit messages.
    pub fn new(
        config: WorkflowConfig,
        vcs: Arc<dyn VersionControl>,
        provider: Arc<dyn CapabilityProvider>,
    ) -> Self {
        Self {
            config,
            vcs,
            provider,
            fetcher: Arc::new(HttpFetcher::new()),
            merge_requests: Arc::new(PlatformCli),
            confirmer: Arc::new(AutoAccept),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_merge_requests(mut self, client: Arc<dyn MergeRequestClient>) -> Self {
        self.merge_requests = client;
        self
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn MessageConfirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Runs one workflow to completion and persists its record.
    ///
    /// Never returns an error: a fatal failure is reported through
    /// [`WorkflowReport::error`] and a [`WorkflowStatus::Failed`] record.
    pub async fn run(&self, workflow_type: WorkflowType, raw_input: &str) -> WorkflowReport {
        let mut run = Run::new(workflow_type);
        info!(run = %run.id, workflow = %workflow_type, input = %raw_input, "workflow started");

        let outputs = OutputStore::for_run(&self.config.state_dir, &run.id);
        let dispatcher = Arc::new(
            AgentDispatcher::new(self.provider.clone(), self.vcs.workdir()).with_outputs(outputs),
        );

        let (status, error) = match self.execute(&mut run, &dispatcher, raw_input).await {
            Ok(()) => {
                run.transition(WorkflowPhase::Completed);
                (WorkflowStatus::Completed, None)
            }
            Err(e) => {
                run.transition(WorkflowPhase::Failed);
                (WorkflowStatus::Failed, Some(e.to_string()))
            }
        };
        self.finish(run, status, error)
    }

    async fn execute(
        &self,
        run: &mut Run,
        dispatcher: &Arc<AgentDispatcher>,
        raw_input: &str,
    ) -> Result<(), WorkflowError> {
        run.transition(WorkflowPhase::Classifying);
        let task = self.classify(run, raw_input)?;
        let task = self.attach_context(run, task).await;
        run.task = Some(task.clone());

        let branch = self.prepare_branch(run, &task)?;
        run.branch = Some(branch.feature_branch_name.clone());
        run.transition(WorkflowPhase::BranchReady);

        run.transition(WorkflowPhase::Dispatching);
        if run.workflow_type == WorkflowType::Audit {
            self.audit(run, dispatcher, &task).await?;
            for name in ["commit", "push", "merge_request"] {
                run.step(name, StepOutcome::Skipped, "audit makes no changes");
            }
            return Ok(());
        }

        let reviews = self.generate_and_review(run, dispatcher, &task).await?;

        run.transition(WorkflowPhase::Finalizing);
        self.finalize(run, dispatcher, &branch, &task, &reviews).await;
        Ok(())
    }

    fn classify(&self, run: &mut Run, raw_input: &str) -> Result<Task, WorkflowError> {
        let classifier = Classifier::new(self.config.default_language.as_str());
        match classifier.classify(raw_input) {
            Ok(task) => {
                run.step(
                    "classify",
                    StepOutcome::Succeeded,
                    format!(
                        "{} (slug {}, language {})",
                        task.kind(),
                        task.slug(),
                        task.language_hint()
                    ),
                );
                Ok(task)
            }
            Err(e) => {
                run.step("classify", StepOutcome::Failed, e.to_string());
                Err(e.into())
            }
        }
    }

    async fn attach_context(&self, run: &mut Run, task: Task) -> Task {
        let extractor = ContextExtractor::new(self.fetcher.clone(), self.config.timeouts.fetch);
        match extractor.extract(&task).await {
            Ok(context) => {
                run.step(
                    "context",
                    StepOutcome::Succeeded,
                    format!("{} bytes", context.len()),
                );
                task.with_context(context)
            }
            Err(e) => {
                run.step(
                    "context",
                    StepOutcome::Degraded,
                    format!("{}; continuing without context", e),
                );
                task
            }
        }
    }

    fn prepare_branch(&self, run: &mut Run, task: &Task) -> Result<BranchState, WorkflowError> {
        let manager = BranchManager::new(
            self.vcs.clone(),
            self.config.remote.as_str(),
            self.config.trunk_override.clone(),
        );
        let branch = match manager.ensure_feature_branch(task) {
            Ok(branch) => branch,
            Err(e) => {
                run.step("branch", StepOutcome::Failed, e.to_string());
                return Err(e.into());
            }
        };

        if branch.stashed {
            run.step(
                "stash",
                StepOutcome::Succeeded,
                "uncommitted changes stashed before branching",
            );
            run.manual_actions.push(format!(
                "Uncommitted changes were stashed before switching to {}.\n\
                 Restore them with `git stash pop` on the branch they belong to.",
                branch.feature_branch_name
            ));
        }
        if let Some(reason) = &branch.pull_error {
            run.step(
                "pull",
                StepOutcome::Degraded,
                format!(
                    "could not refresh {} from {}: {}",
                    branch.trunk_name, self.config.remote, reason
                ),
            );
        }
        let message = if branch.resumed {
            format!("resumed {}", branch.feature_branch_name)
        } else {
            format!(
                "created {} from {}",
                branch.feature_branch_name, branch.trunk_name
            )
        };
        run.step("branch", StepOutcome::Succeeded, message);
        Ok(branch)
    }

    /// Runs the Coder (mandatory), then the Reviewer (advisory), then test
    /// generation when enabled (advisory).
    async fn generate_and_review(
        &self,
        run: &mut Run,
        dispatcher: &AgentDispatcher,
        task: &Task,
    ) -> Result<Vec<String>, WorkflowError> {
        let prompt = match run.workflow_type {
            WorkflowType::Integration => prompts::integration(task),
            _ => prompts::code_generation(task),
        };
        let invocation = AgentInvocation::new(
            AgentRole::Coder,
            self.config.coder.primary.as_str(),
            prompt,
            self.config.timeouts.coder,
        )
        .with_fallback(self.config.coder.fallback.as_deref());

        let generated = dispatcher.invoke(&invocation).await;
        run.record_agent(&generated);
        if !generated.succeeded() {
            let reasons = generated.failure_summary();
            run.step(
                "generate",
                StepOutcome::Failed,
                format!("every coder agent failed: {}", reasons),
            );
            return Err(WorkflowError::MandatoryAgentFailed {
                role: AgentRole::Coder,
                reasons,
            });
        }

        let files = match self.vcs.changed_files() {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "could not list changed files");
                Vec::new()
            }
        };
        run.step(
            "generate",
            StepOutcome::Succeeded,
            format!(
                "{} changed {} file(s){}",
                generated.tool_used().unwrap_or("agent"),
                files.len(),
                if files.is_empty() {
                    String::new()
                } else {
                    format!(": {}", files.join(", "))
                }
            ),
        );

        let material = match review_material(self.vcs.workdir(), &files) {
            Some(material) => material,
            None => {
                let mut stdout = generated.stdout().unwrap_or_default().to_string();
                truncate_context(&mut stdout);
                stdout
            }
        };
        let subject = run
            .branch
            .clone()
            .unwrap_or_else(|| task.raw_input().to_string());
        let invocation = AgentInvocation::new(
            AgentRole::Reviewer,
            self.config.reviewer.primary.as_str(),
            prompts::review(
                self.config.review_focus,
                task.language_hint(),
                &subject,
                &material,
            ),
            self.config.timeouts.reviewer,
        )
        .with_fallback(self.config.reviewer.fallback.as_deref());

        let review = dispatcher.invoke(&invocation).await;
        run.record_agent(&review);
        let mut reviews = Vec::new();
        match review.stdout() {
            Some(text) => {
                run.step("review", StepOutcome::Succeeded, review_message(&review));
                reviews.push(text.to_string());
            }
            None => run.step(
                "review",
                StepOutcome::Degraded,
                format!("review unavailable: {}", review.failure_summary()),
            ),
        }

        if self.config.generate_tests {
            self.generate_tests(run, dispatcher, task, &files).await;
        }
        Ok(reviews)
    }

    /// Asks the Reviewer for a test file per changed source file and writes
    /// each one under `tests/` so it is committed with the feature.
    ///
    /// Existing files are never overwritten.
    async fn generate_tests(
        &self,
        run: &mut Run,
        dispatcher: &AgentDispatcher,
        task: &Task,
        changed: &[String],
    ) {
        let targets = testgen::test_targets(changed);
        if targets.is_empty() {
            run.step("tests", StepOutcome::Skipped, "no changed source files to test");
            return;
        }
        let workdir = self.vcs.workdir();

        for source in targets {
            let step = format!("tests {}", source);
            let language = Path::new(&source)
                .extension()
                .and_then(|ext| language_for_extension(&ext.to_string_lossy()))
                .unwrap_or(task.language_hint());
            let framework = self
                .config
                .test_framework
                .clone()
                .unwrap_or_else(|| testgen::default_framework(language).to_string());
            let Some(relative) = testgen::test_file_path(&source) else {
                continue;
            };
            let mut code = match std::fs::read_to_string(workdir.join(&source)) {
                Ok(code) => code,
                Err(e) => {
                    run.step(step, StepOutcome::Degraded, format!("unreadable: {}", e));
                    continue;
                }
            };
            truncate_context(&mut code);

            let invocation = AgentInvocation::new(
                AgentRole::Reviewer,
                self.config.reviewer.primary.as_str(),
                prompts::test_generation(&framework, language, &source, &code),
                self.config.timeouts.reviewer,
            )
            .with_fallback(self.config.reviewer.fallback.as_deref());

            let result = dispatcher.invoke(&invocation).await;
            run.record_agent(&result);
            let Some(tests) = result.stdout().and_then(testgen::extract_code) else {
                let reason = if result.succeeded() {
                    "reply contained no code".to_string()
                } else {
                    result.failure_summary()
                };
                run.step(step, StepOutcome::Degraded, format!("no tests generated: {}", reason));
                continue;
            };

            match atomic_create(&workdir.join(&relative), tests.as_bytes()) {
                Ok(()) => run.step(
                    step,
                    StepOutcome::Succeeded,
                    format!("wrote {} for {}", relative, framework),
                ),
                Err(e) => run.step(
                    step,
                    StepOutcome::Degraded,
                    format!("could not write {}: {}", relative, e),
                ),
            }
        }
    }

    /// Reviews the target. At least one review has to succeed.
    async fn audit(
        &self,
        run: &mut Run,
        dispatcher: &AgentDispatcher,
        task: &Task,
    ) -> Result<(), WorkflowError> {
        let mut targets: Vec<(String, String, ReviewFocus)> = Vec::new();
        let mut unreadable = 0usize;

        if task.kind() == TaskKind::Directory {
            let root = expand_path(task.raw_input());
            for path in collect_source_files(&root, self.config.audit_file_limit()) {
                let name = path
                    .strip_prefix(&root)
                    .unwrap_or(&path)
                    .display()
                    .to_string();
                match std::fs::read_to_string(&path) {
                    Ok(mut code) => {
                        truncate_context(&mut code);
                        targets.push((name, code, ReviewFocus::Security));
                    }
                    Err(e) => {
                        unreadable += 1;
                        run.step(
                            format!("review {}", name),
                            StepOutcome::Degraded,
                            format!("unreadable: {}", e),
                        );
                    }
                }
            }
        }
        if targets.is_empty() && unreadable == 0 {
            targets.push((
                task.raw_input().to_string(),
                task.context().to_string(),
                self.config.review_focus,
            ));
        }

        let total = targets.len() + unreadable;
        let per_file = task.kind() == TaskKind::Directory && total > 1;
        let mut reviewed = 0usize;
        let mut failures = Vec::new();

        for (subject, code, focus) in targets {
            let invocation = AgentInvocation::new(
                AgentRole::Reviewer,
                self.config.reviewer.primary.as_str(),
                prompts::review(focus, task.language_hint(), &subject, &code),
                self.config.timeouts.reviewer,
            )
            .with_fallback(self.config.reviewer.fallback.as_deref());

            let result = dispatcher.invoke(&invocation).await;
            run.record_agent(&result);
            let name = if per_file {
                format!("review {}", subject)
            } else {
                "review".to_string()
            };
            if result.succeeded() {
                reviewed += 1;
                run.step(name, StepOutcome::Succeeded, review_message(&result));
            } else {
                let reasons = result.failure_summary();
                run.step(name, StepOutcome::Degraded, reasons.clone());
                failures.push(format!("{}: {}", subject, reasons));
            }
        }

        if reviewed == 0 {
            let reasons = if failures.is_empty() {
                "no file could be read".to_string()
            } else {
                failures.join("; ")
            };
            run.step("audit", StepOutcome::Failed, "no review succeeded");
            return Err(WorkflowError::MandatoryAgentFailed {
                role: AgentRole::Reviewer,
                reasons,
            });
        }
        run.step(
            "audit",
            StepOutcome::Succeeded,
            format!(
                "reviewed {} of {} target(s), {} audit",
                reviewed, total, self.config.audit_depth
            ),
        );
        Ok(())
    }

    async fn finalize(
        &self,
        run: &mut Run,
        dispatcher: &Arc<AgentDispatcher>,
        branch: &BranchState,
        task: &Task,
        reviews: &[String],
    ) {
        let composer = CommitComposer::new(
            self.vcs.clone(),
            dispatcher.clone(),
            ComposerSettings::from_config(&self.config),
        )
        .with_merge_requests(self.merge_requests.clone())
        .with_confirmer(self.confirmer.clone());

        let finalized = composer.finalize(branch, task, reviews).await;
        for result in &finalized.agent_results {
            run.record_agent(result);
        }

        match finalized.outcome {
            CommitOutcome::Failed(failure) => {
                let message = match failure {
                    CommitFailure::NoChanges => "no changes to commit".to_string(),
                    CommitFailure::Vcs(reason) => reason,
                };
                run.step("commit", StepOutcome::Degraded, message);
                run.step("push", StepOutcome::Skipped, "nothing committed");
                run.step("merge_request", StepOutcome::Skipped, "nothing committed");
            }
            CommitOutcome::Committed {
                sha,
                message,
                source,
                push,
                merge_request,
            } => {
                let source = match source {
                    MessageSource::Agent { role, tool } => format!("{} ({})", tool, role),
                    MessageSource::Template => "template".to_string(),
                };
                run.step(
                    "commit",
                    StepOutcome::Succeeded,
                    format!(
                        "{} {} [message from {}]",
                        sha.get(..7).unwrap_or(&sha),
                        message.lines().next().unwrap_or_default(),
                        source
                    ),
                );

                match push {
                    PushStatus::Pushed { remote } => run.step(
                        "push",
                        StepOutcome::Succeeded,
                        format!("pushed {} to {}", branch.feature_branch_name, remote),
                    ),
                    PushStatus::Failed { reason } => {
                        run.step("push", StepOutcome::Degraded, reason);
                        run.manual_actions.push(format!(
                            "The commit was kept locally. Push it with:\n  git push -u {} {}",
                            self.config.remote, branch.feature_branch_name
                        ));
                    }
                }

                match merge_request {
                    MergeRequestStatus::Created { platform, url } => run.step(
                        "merge_request",
                        StepOutcome::Succeeded,
                        format!("{} {}", platform, url),
                    ),
                    MergeRequestStatus::Manual {
                        reason,
                        instructions,
                        ..
                    } => {
                        run.step("merge_request", StepOutcome::Degraded, reason);
                        run.manual_actions.push(instructions);
                    }
                    MergeRequestStatus::Skipped => run.step(
                        "merge_request",
                        StepOutcome::Skipped,
                        "branch was not pushed",
                    ),
                }
            }
        }
    }

    fn finish(&self, run: Run, status: WorkflowStatus, error: Option<String>) -> WorkflowReport {
        let record = WorkflowRecord {
            id: run.id,
            workflow_type: run.workflow_type,
            task: run.task,
            branch: run.branch,
            steps: run.steps,
            invocations: run.invocations,
            status,
            timestamp: Utc::now(),
        };

        let record_path = match RecordStore::new(&self.config.state_dir).append(&record) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "could not write workflow record");
                None
            }
        };

        let outcome = RunOutcome::of(&record);
        info!(
            run = %record.id,
            outcome = outcome.label(),
            degraded = record.degraded_steps().count(),
            "workflow finished"
        );

        WorkflowReport {
            record,
            record_path,
            outcome,
            error,
            manual_actions: run.manual_actions,
        }
    }
}

fn review_message(result: &AgentResult) -> String {
    let tool = result.tool_used().unwrap_or("agent");
    match &result.output_path {
        Some(path) => format!("{} review saved to {}", tool, path.display()),
        None => format!("{} review received", tool),
    }
}

/// Concatenates the readable files among `files`, bounded by the context cap.
fn review_material(workdir: &Path, files: &[String]) -> Option<String> {
    let mut material = String::new();
    for file in files {
        if let Ok(content) = std::fs::read_to_string(workdir.join(file)) {
            material.push_str(&format!("=== {} ===\n{}\n", file, content));
        }
    }
    if material.is_empty() {
        return None;
    }
    truncate_context(&mut material);
    Some(material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_material_reads_existing_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "print('a')").unwrap();

        let material =
            review_material(dir.path(), &["a.py".to_string(), "gone.py".to_string()]).unwrap();
        assert!(material.contains("=== a.py ===\nprint('a')"));
        assert!(!material.contains("gone.py"));

        assert!(review_material(dir.path(), &["gone.py".to_string()]).is_none());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(WorkflowPhase::BranchReady.to_string(), "branch-ready");
        assert_eq!(WorkflowPhase::Failed.to_string(), "failed");
    }
}
