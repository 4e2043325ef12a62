//! Capability detection.
//!
//! A [`CapabilityProvider`] answers "can this agent run here?" with either a
//! handle that runs it or the reason it cannot. The dispatcher only ever
//! talks to agents through this seam, so tests substitute scripted tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devflow_models::{Access, AgentRole, ProcessOutput};
use tracing::debug;

use crate::process::{run_with_stdin, ExecError};
use crate::registry::AdapterRegistry;
use crate::traits::{AdapterInfo, AgentAdapter};

/// A runnable agent.
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Canonical adapter id.
    fn id(&self) -> &str;

    /// Runs the agent once with `payload` on stdin. Edit permission is
    /// granted only for [`Access::Edit`].
    async fn execute(
        &self,
        role: AgentRole,
        access: Access,
        payload: &str,
        workdir: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, ExecError>;
}

/// Whether a tool can be used.
#[derive(Clone)]
pub enum Capability {
    Available(Arc<dyn AgentTool>),
    Unavailable { tool: String, reason: String },
}

impl Capability {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Available(tool) => f.debug_tuple("Available").field(&tool.id()).finish(),
            Capability::Unavailable { tool, reason } => f
                .debug_struct("Unavailable")
                .field("tool", tool)
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Resolves tool ids to capabilities.
pub trait CapabilityProvider: Send + Sync {
    fn resolve(&self, tool_id: &str) -> Capability;
}

/// An adapter bound to a located executable.
pub struct SubprocessTool {
    adapter: Arc<dyn AgentAdapter>,
    program: PathBuf,
}

impl SubprocessTool {
    pub fn new(adapter: Arc<dyn AgentAdapter>, program: impl Into<PathBuf>) -> Self {
        Self {
            adapter,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl AgentTool for SubprocessTool {
    fn id(&self) -> &str {
        &self.adapter.info().id
    }

    async fn execute(
        &self,
        role: AgentRole,
        access: Access,
        payload: &str,
        workdir: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, ExecError> {
        debug!(tool = %self.id(), role = %role, access = ?access, "launching agent");
        let args = self.adapter.args_for(access);
        let prompt = self.adapter.format_prompt(payload);
        run_with_stdin(&self.program, &args, workdir, &prompt, timeout).await
    }
}

/// Locates adapters' programs on `PATH`.
pub struct SystemProvider {
    registry: AdapterRegistry,
}

impl SystemProvider {
    pub fn new(registry: AdapterRegistry) -> Self {
        Self { registry }
    }

    /// Every registered adapter with its current capability.
    pub fn survey(&self) -> Vec<(AdapterInfo, Capability)> {
        self.registry
            .list()
            .into_iter()
            .filter_map(|id| self.registry.get(id))
            .map(|adapter| {
                let capability = self.resolve(&adapter.info().id);
                (adapter.info().clone(), capability)
            })
            .collect()
    }
}

impl Default for SystemProvider {
    fn default() -> Self {
        Self::new(AdapterRegistry::new())
    }
}

impl CapabilityProvider for SystemProvider {
    fn resolve(&self, tool_id: &str) -> Capability {
        let Some(adapter) = self.registry.get(tool_id) else {
            return Capability::Unavailable {
                tool: tool_id.to_string(),
                reason: "unknown agent".to_string(),
            };
        };

        let info = adapter.info();
        match which::which(&info.command) {
            Ok(program) => {
                debug!(tool = %info.id, program = %program.display(), "agent available");
                Capability::Available(Arc::new(SubprocessTool::new(adapter.clone(), program)))
            }
            Err(_) => Capability::Unavailable {
                tool: info.id.clone(),
                reason: format!("`{}` not found in PATH", info.command),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CatAdapter {
        info: AdapterInfo,
    }

    impl CatAdapter {
        fn new(command: &str) -> Self {
            Self {
                info: AdapterInfo {
                    id: "cat".into(),
                    name: "Cat".into(),
                    description: "echoes its prompt".into(),
                    command: command.into(),
                    default_args: vec![],
                },
            }
        }
    }

    impl AgentAdapter for CatAdapter {
        fn info(&self) -> &AdapterInfo {
            &self.info
        }

        fn format_prompt(&self, payload: &str) -> String {
            format!("PROMPT: {}", payload)
        }
    }

    fn provider(command: &str) -> SystemProvider {
        let mut registry = AdapterRegistry::empty();
        registry.register(Arc::new(CatAdapter::new(command)));
        SystemProvider::new(registry)
    }

    #[test]
    fn test_unknown_agent_is_unavailable() {
        match SystemProvider::default().resolve("aider") {
            Capability::Unavailable { tool, reason } => {
                assert_eq!(tool, "aider");
                assert_eq!(reason, "unknown agent");
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let capability = provider("devflow-no-such-program").resolve("cat");
        assert!(!capability.is_available());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_available_tool_runs_formatted_prompt() {
        let capability = provider("cat").resolve("cat");
        let Capability::Available(tool) = capability else {
            panic!("cat should be on PATH");
        };
        assert_eq!(tool.id(), "cat");

        let dir = tempfile::tempdir().unwrap();
        let output = tool
            .execute(
                AgentRole::Reviewer,
                Access::ReadOnly,
                "hi",
                dir.path(),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(output.stdout, "PROMPT: hi");
    }

    #[test]
    fn test_survey_lists_builtins() {
        let survey = SystemProvider::default().survey();
        let ids: Vec<&str> = survey.iter().map(|(info, _)| info.id.as_str()).collect();
        assert_eq!(ids, vec!["claude-code", "gemini"]);
    }
}
