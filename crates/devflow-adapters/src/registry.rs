//! Adapter registry for discovering adapters by id or alias.

use std::collections::HashMap;
use std::sync::Arc;

use crate::claude_code::ClaudeCodeAdapter;
use crate::gemini::GeminiAdapter;
use crate::traits::AgentAdapter;

/// Short names accepted wherever an adapter id is.
const ALIASES: &[(&str, &str)] = &[("cc", "claude-code"), ("claude", "claude-code")];

/// Registry for agent adapters.
///
/// All adapters are stored as `Arc<dyn AgentAdapter>` to allow sharing
/// across tasks.
///
/// # Example
///
/// ```
/// use devflow_adapters::AdapterRegistry;
///
/// let registry = AdapterRegistry::new();
/// let adapter = registry.get("cc").unwrap();
/// assert_eq!(adapter.info().id, "claude-code");
/// ```
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn AgentAdapter>>,
}

impl AdapterRegistry {
    /// Creates a new registry with all built-in adapters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ClaudeCodeAdapter::new()));
        registry.register(Arc::new(GeminiAdapter::new()));
        registry
    }

    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registers an adapter, replacing any with the same id.
    pub fn register(&mut self, adapter: Arc<dyn AgentAdapter>) {
        let id = adapter.info().id.clone();
        self.adapters.insert(id, adapter);
    }

    /// Gets an adapter by id or alias.
    pub fn get(&self, id: &str) -> Option<Arc<dyn AgentAdapter>> {
        self.resolve(id).and_then(|id| self.adapters.get(id).cloned())
    }

    /// Resolves an id or alias to a registered adapter id.
    pub fn resolve<'a>(&'a self, alias: &'a str) -> Option<&'a str> {
        if let Some((id, _)) = self.adapters.get_key_value(alias) {
            return Some(id.as_str());
        }
        ALIASES
            .iter()
            .find(|(short, _)| *short == alias)
            .map(|(_, id)| *id)
            .filter(|id| self.adapters.contains_key(*id))
    }

    /// Lists all registered adapter ids, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.adapters.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
