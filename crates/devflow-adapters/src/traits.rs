//! Core traits for agent adapters.
//!
//! An adapter describes how to launch one command-line agent. Prompts are
//! always written to the process's standard input; adapters only decide the
//! program and its arguments.

use devflow_models::Access;

/// Information about an agent adapter.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    /// Unique identifier for this adapter type.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the adapter.
    pub description: String,
    /// Program to launch.
    pub command: String,
    /// Arguments used for every role.
    pub default_args: Vec<String>,
}

/// Trait for agent adapters.
pub trait AgentAdapter: Send + Sync {
    /// Returns information about this adapter.
    fn info(&self) -> &AdapterInfo;

    /// Arguments for a run with the given file access.
    fn args_for(&self, access: Access) -> Vec<String> {
        let _ = access;
        self.info().default_args.clone()
    }

    /// Formats a payload before it is written to stdin.
    fn format_prompt(&self, payload: &str) -> String {
        payload.to_string()
    }
}
