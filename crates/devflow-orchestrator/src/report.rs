//! Run reports for the invoking caller.

use std::fmt::Write as _;
use std::path::PathBuf;

use devflow_models::{StepOutcome, WorkflowRecord, WorkflowStatus};

/// Overall result of a run, as surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Completed, but at least one step degraded.
    Degraded,
    /// A fatal error stopped the run.
    Failure,
}

impl RunOutcome {
    pub fn of(record: &WorkflowRecord) -> Self {
        match record.status {
            WorkflowStatus::Failed => RunOutcome::Failure,
            WorkflowStatus::Completed if record.is_degraded() => RunOutcome::Degraded,
            WorkflowStatus::Completed => RunOutcome::Success,
        }
    }

    /// Process exit code: 0 success, 2 degraded, 1 failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::Degraded => 2,
            RunOutcome::Failure => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Success => "completed",
            RunOutcome::Degraded => "completed with degraded steps",
            RunOutcome::Failure => "failed",
        }
    }
}

/// Everything a caller needs after a run.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub record: WorkflowRecord,
    /// `None` if the record could not be written.
    pub record_path: Option<PathBuf>,
    pub outcome: RunOutcome,
    /// The fatal error, verbatim.
    pub error: Option<String>,
    /// Follow-ups the user has to do by hand.
    pub manual_actions: Vec<String>,
}

impl WorkflowReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    /// Human-readable summary: status, step log, manual actions.
    pub fn render(&self) -> String {
        let record = &self.record;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "Workflow {} {} ({})",
            record.workflow_type,
            self.outcome.label(),
            record.id
        );
        if let Some(task) = &record.task {
            let _ = write!(out, "Task: {} {}", task.kind(), task.raw_input());
            if let Some(branch) = &record.branch {
                let _ = write!(out, " -> {}", branch);
            }
            out.push('\n');
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Error: {}", error);
        }

        out.push_str("\nSteps:\n");
        for step in &record.steps {
            let _ = writeln!(out, "  {:<10} {}: {}", step.outcome.marker(), step.name, step.message);
        }

        let degraded: Vec<&str> = record
            .steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Degraded)
            .map(|s| s.name.as_str())
            .collect();
        if !degraded.is_empty() {
            let _ = writeln!(out, "\nDegraded: {}", degraded.join(", "));
        }

        if !self.manual_actions.is_empty() {
            out.push_str("\nManual actions:\n");
            for action in &self.manual_actions {
                let mut lines = action.lines();
                if let Some(first) = lines.next() {
                    let _ = writeln!(out, "  - {}", first);
                }
                for line in lines {
                    let _ = writeln!(out, "    {}", line);
                }
            }
        }

        match &self.record_path {
            Some(path) => {
                let _ = writeln!(out, "\nRecord: {}", path.display());
            }
            None => out.push_str("\nRecord: not written\n"),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use devflow_models::{RunId, Task, TaskKind, WorkflowStep, WorkflowType};

    fn record(status: WorkflowStatus, steps: Vec<WorkflowStep>) -> WorkflowRecord {
        WorkflowRecord {
            id: RunId::from_string("run-abc"),
            workflow_type: WorkflowType::Feature,
            task: Some(Task::new("auth.py", TaskKind::File, "auth", "python")),
            branch: Some("feature/auth".into()),
            steps,
            invocations: Vec::new(),
            status,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_outcome_and_exit_codes() {
        let ok = record(
            WorkflowStatus::Completed,
            vec![WorkflowStep::new("commit", StepOutcome::Succeeded, "abc")],
        );
        assert_eq!(RunOutcome::of(&ok), RunOutcome::Success);
        assert_eq!(RunOutcome::of(&ok).exit_code(), 0);

        let degraded = record(
            WorkflowStatus::Completed,
            vec![WorkflowStep::new("push", StepOutcome::Degraded, "denied")],
        );
        assert_eq!(RunOutcome::of(&degraded).exit_code(), 2);

        let failed = record(WorkflowStatus::Failed, vec![]);
        assert_eq!(RunOutcome::of(&failed).exit_code(), 1);
    }

    #[test]
    fn test_render() {
        let rec = record(
            WorkflowStatus::Completed,
            vec![
                WorkflowStep::new("classify", StepOutcome::Succeeded, "file"),
                WorkflowStep::new("push", StepOutcome::Degraded, "permission denied"),
            ],
        );
        let report = WorkflowReport {
            outcome: RunOutcome::of(&rec),
            record: rec,
            record_path: None,
            error: None,
            manual_actions: vec!["Push it\n  git push".into()],
        };
        let text = report.render();
        assert!(text.starts_with("Workflow feature completed with degraded steps (run-abc)"));
        assert!(text.contains("Task: file auth.py -> feature/auth"));
        assert!(text.contains("[degraded] push: permission denied"));
        assert!(text.contains("Degraded: push"));
        assert!(text.contains("  - Push it\n      git push"));
        assert!(text.contains("Record: not written"));
    }
}
