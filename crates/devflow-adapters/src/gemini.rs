//! Gemini CLI adapter.

use devflow_models::Access;

use crate::traits::{AdapterInfo, AgentAdapter};

/// Runs `gemini` with the prompt on stdin.
pub struct GeminiAdapter {
    info: AdapterInfo,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            info: AdapterInfo {
                id: "gemini".to_string(),
                name: "Gemini CLI".to_string(),
                description: "Google's Gemini CLI reading its prompt from stdin".to_string(),
                command: "gemini".to_string(),
                default_args: vec![],
            },
        }
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentAdapter for GeminiAdapter {
    fn info(&self) -> &AdapterInfo {
        &self.info
    }

    fn args_for(&self, access: Access) -> Vec<String> {
        match access {
            Access::Edit => vec!["--yolo".to_string()],
            Access::ReadOnly => self.info.default_args.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info() {
        let adapter = GeminiAdapter::new();
        assert_eq!(adapter.info().id, "gemini");
        assert!(adapter.args_for(Access::ReadOnly).is_empty());
        assert_eq!(adapter.args_for(Access::Edit), vec!["--yolo"]);
    }
}
