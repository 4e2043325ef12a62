//! Agent dispatch with a single fallback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use devflow_adapters::{Capability, CapabilityProvider, ExecError};
use devflow_models::{AgentAttempt, AgentInvocation, AgentResult, AttemptOutcome};
use devflow_persistence::OutputStore;
use tracing::{debug, info, warn};

/// Runs agent invocations against whatever tools the provider offers.
pub struct AgentDispatcher {
    provider: Arc<dyn CapabilityProvider>,
    workdir: PathBuf,
    outputs: Option<OutputStore>,
}

impl AgentDispatcher {
    /// Creates a dispatcher that runs tools in `workdir`.
    pub fn new(provider: Arc<dyn CapabilityProvider>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            workdir: workdir.into(),
            outputs: None,
        }
    }

    /// Writes successful outputs to `store`.
    pub fn with_outputs(mut self, store: OutputStore) -> Self {
        self.outputs = Some(store);
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Runs the primary tool and, if it fails in any way, the fallback once.
    ///
    /// The fallback gets the same payload and a fresh timeout. A fallback
    /// naming the primary tool is ignored. Failure is reported in the
    /// returned result, never as an error.
    pub async fn invoke(&self, invocation: &AgentInvocation) -> AgentResult {
        let mut result = AgentResult::new(invocation.role);

        let mut tools = vec![invocation.primary_tool.as_str()];
        if let Some(fallback) = invocation.fallback_tool.as_deref() {
            if fallback != invocation.primary_tool {
                tools.push(fallback);
            }
        }

        for tool in tools {
            let attempt = self.attempt(invocation, tool).await;
            let succeeded = attempt.succeeded();
            if let Some(reason) = attempt.failure_reason() {
                warn!(role = %invocation.role, tool = %tool, reason = %reason, "agent attempt failed");
            }
            result.attempts.push(attempt);
            if succeeded {
                break;
            }
        }

        match result.stdout().map(str::to_string) {
            Some(stdout) => {
                info!(role = %invocation.role, tool = ?result.tool_used(), "agent succeeded");
                if let Some(store) = &self.outputs {
                    match store.write(invocation.role, &stdout) {
                        Ok(path) => result.output_path = Some(path),
                        Err(e) => warn!(error = %e, "could not write agent output"),
                    }
                }
            }
            None => {
                warn!(role = %invocation.role, failures = %result.failure_summary(), "every agent attempt failed");
            }
        }
        result
    }

    async fn attempt(&self, invocation: &AgentInvocation, tool_id: &str) -> AgentAttempt {
        let outcome = match self.provider.resolve(tool_id) {
            Capability::Unavailable { reason, .. } => AttemptOutcome::Unavailable { reason },
            Capability::Available(tool) => {
                debug!(role = %invocation.role, tool = %tool_id, timeout_secs = invocation.timeout.as_secs(), "invoking agent");
                match tool
                    .execute(
                        invocation.role,
                        invocation.access,
                        &invocation.payload,
                        &self.workdir,
                        invocation.timeout,
                    )
                    .await
                {
                    Ok(output) => AttemptOutcome::Completed(output),
                    Err(ExecError::TimedOut { timeout, .. }) => AttemptOutcome::TimedOut {
                        timeout_secs: timeout.as_secs(),
                    },
                    Err(e) => AttemptOutcome::LaunchFailed {
                        message: e.to_string(),
                    },
                }
            }
        };
        AgentAttempt {
            tool: tool_id.to_string(),
            outcome,
        }
    }
}
