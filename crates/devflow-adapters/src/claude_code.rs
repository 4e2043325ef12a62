//! Claude Code adapter.

use devflow_models::Access;

use crate::traits::{AdapterInfo, AgentAdapter};

/// Runs `claude --print` with the prompt on stdin.
pub struct ClaudeCodeAdapter {
    info: AdapterInfo,
}

impl ClaudeCodeAdapter {
    pub fn new() -> Self {
        Self {
            info: AdapterInfo {
                id: "claude-code".to_string(),
                name: "Claude Code".to_string(),
                description: "Anthropic's Claude Code CLI in non-interactive mode".to_string(),
                command: "claude".to_string(),
                default_args: vec!["--print".to_string()],
            },
        }
    }
}

impl Default for ClaudeCodeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentAdapter for ClaudeCodeAdapter {
    fn info(&self) -> &AdapterInfo {
        &self.info
    }

    fn args_for(&self, access: Access) -> Vec<String> {
        let mut args = self.info.default_args.clone();
        if access == Access::Edit {
            args.extend(["--permission-mode".to_string(), "acceptEdits".to_string()]);
        }
        args
    }
}
