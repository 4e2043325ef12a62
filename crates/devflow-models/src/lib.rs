//! Core data models for Devflow.
//!
//! This crate provides the data types shared by every stage of a workflow
//! run: the classified task, branch state, agent invocations and results,
//! and the persisted workflow record.

pub mod agent;
pub mod branch;
pub mod ids;
pub mod task;
pub mod workflow;

// Re-export main types
pub use agent::{
    Access, AgentAttempt, AgentInvocation, AgentResult, AgentRole, AttemptOutcome, InvocationSummary,
    ProcessOutput,
};
pub use branch::{feature_branch_name, BranchState, FEATURE_PREFIX};
pub use ids::RunId;
pub use task::{sanitize_slug, truncate_context, Task, TaskKind, MAX_CONTEXT_BYTES};
pub use workflow::{
    StepOutcome, WorkflowRecord, WorkflowStatus, WorkflowStep, WorkflowType,
};
