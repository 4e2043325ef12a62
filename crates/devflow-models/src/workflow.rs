//! Workflow record types.
//!
//! A workflow record is written once at the end of a run, whatever the
//! outcome, and never modified afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::InvocationSummary;
use crate::ids::RunId;
use crate::task::Task;

/// Kind of workflow a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Generate a feature, review it, commit it.
    Feature,
    /// Review existing code without generating any.
    Audit,
    /// Generate integration code against a remote resource.
    Integration,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::Feature => "feature",
            WorkflowType::Audit => "audit",
            WorkflowType::Integration => "integration",
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Completed,
    Failed,
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    /// Failed without stopping the run.
    Degraded,
    /// Failed and stopped the run.
    Failed,
    /// Did not apply to this run.
    Skipped,
}

impl StepOutcome {
    /// Marker used when rendering a step log.
    pub fn marker(&self) -> &'static str {
        match self {
            StepOutcome::Succeeded => "[ok]",
            StepOutcome::Degraded => "[degraded]",
            StepOutcome::Failed => "[failed]",
            StepOutcome::Skipped => "[skipped]",
        }
    }
}

/// One entry in a run's step log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub name: String,
    pub outcome: StepOutcome,
    pub message: String,
}

impl WorkflowStep {
    pub fn new(name: impl Into<String>, outcome: StepOutcome, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome,
            message: message.into(),
        }
    }
}

/// Persisted summary of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: RunId,
    pub workflow_type: WorkflowType,
    /// `None` when classification itself failed.
    pub task: Option<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub invocations: Vec<InvocationSummary>,
    pub status: WorkflowStatus,
    pub timestamp: DateTime<Utc>,
}

impl WorkflowRecord {
    /// Steps that failed without stopping the run.
    pub fn degraded_steps(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Degraded)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded_steps().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskKind;

    fn record(steps: Vec<WorkflowStep>) -> WorkflowRecord {
        WorkflowRecord {
            id: RunId::from_string("run-1"),
            workflow_type: WorkflowType::Feature,
            task: Some(Task::new("x", TaskKind::FeatureText, "x", "rust")),
            branch: Some("feature/x".into()),
            steps,
            invocations: Vec::new(),
            status: WorkflowStatus::Completed,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_degraded_detection() {
        let clean = record(vec![WorkflowStep::new("classify", StepOutcome::Succeeded, "ok")]);
        assert!(!clean.is_degraded());

        let degraded = record(vec![
            WorkflowStep::new("classify", StepOutcome::Succeeded, "ok"),
            WorkflowStep::new("push", StepOutcome::Degraded, "no remote"),
        ]);
        assert!(degraded.is_degraded());
        assert_eq!(degraded.degraded_steps().count(), 1);
    }

    #[test]
    fn test_record_serialization() {
        let rec = record(vec![WorkflowStep::new("review", StepOutcome::Skipped, "audit")]);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["workflow_type"], "feature");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["steps"][0]["outcome"], "skipped");
        assert_eq!(json["task"]["kind"], "feature_text");
    }

    #[test]
    fn test_markers() {
        assert_eq!(StepOutcome::Degraded.marker(), "[degraded]");
        assert_eq!(StepOutcome::Succeeded.marker(), "[ok]");
    }
}
