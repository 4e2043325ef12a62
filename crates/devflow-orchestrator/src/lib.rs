//! Devflow Orchestrator - runs a workflow from raw input to merge request.
//!
//! - [`WorkflowCoordinator`]: the phase machine driving one run
//! - [`AgentDispatcher`]: primary/fallback agent invocation
//! - [`CommitComposer`]: staging, commit message, push and merge request
//! - [`WorkflowReport`]: what the caller gets back, including the exit code

pub mod composer;
pub mod confirm;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod platform;
pub mod prompts;
pub mod report;
pub mod testgen;

pub use composer::{
    template_message, CommitComposer, CommitFailure, CommitOutcome, ComposerSettings, Finalized,
    MergeRequestStatus, MessageSource, PushStatus,
};
pub use confirm::{AutoAccept, MessageConfirmer};
pub use coordinator::{WorkflowCoordinator, WorkflowPhase};
pub use dispatcher::AgentDispatcher;
pub use error::{MergeRequestError, Result, WorkflowError};
pub use platform::{detect_platform, MergeRequest, MergeRequestClient, Platform, PlatformCli};
pub use report::{RunOutcome, WorkflowReport};
