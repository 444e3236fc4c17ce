//! Tool contract and the process-wide tool registry.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::model::ParamMap;

/// A boxed, `Send` future — the object-safe return type for [`Tool::execute`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Unit of pure computation: takes a parameter mapping, returns a result
/// mapping, may fail. Must be safe to invoke concurrently; holds no
/// per-invocation mutable state shared across calls.
pub trait Tool: Send + Sync {
    /// Stable, unique tool name.
    fn name(&self) -> &str;

    /// Human-readable description, surfaced by `list()` and `/tools`.
    fn description(&self) -> &str;

    /// Execute the tool against a parameter mapping.
    fn execute(&self, parameters: ParamMap) -> BoxFuture<'_, Result<ParamMap, String>>;
}

#[derive(Debug, Error)]
pub enum ToolRegistryError {
    #[error("tool '{0}' is already registered (pass overwrite=true to replace it)")]
    AlreadyRegistered(String),

    #[error("unknown tool '{name}'. Known tools: {known}")]
    NotFound { name: String, known: String },
}

/// Name → description pair, as returned by [`ToolRegistry::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Process-wide name → tool mapping. Thread-safe for concurrent reads;
/// writes are expected at startup but are not restricted to it, so tests
/// can inject isolated instances freely.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if the name is already present unless
    /// `overwrite` is set.
    pub fn register(
        &self,
        tool: Arc<dyn Tool>,
        overwrite: bool,
    ) -> Result<(), ToolRegistryError> {
        let mut tools = self.tools.write().expect("tool registry lock poisoned");
        let name = tool.name().to_string();
        if !overwrite && tools.contains_key(&name) {
            return Err(ToolRegistryError::AlreadyRegistered(name));
        }
        tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>, ToolRegistryError> {
        let tools = self.tools.read().expect("tool registry lock poisoned");
        tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolRegistryError::NotFound {
                name: name.to_string(),
                known: known_names(tools.keys()),
            })
    }

    /// List all registered tools. Order is unspecified.
    pub fn list(&self) -> Vec<ToolInfo> {
        let tools = self.tools.read().expect("tool registry lock poisoned");
        tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Remove a tool by name. No-op if absent.
    pub fn unregister(&self, name: &str) {
        let mut tools = self.tools.write().expect("tool registry lock poisoned");
        tools.remove(name);
    }
}

fn known_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let mut names: Vec<&str> = names.map(String::as_str).collect();
    names.sort_unstable();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "returns its input unchanged"
        }

        fn execute(&self, parameters: ParamMap) -> BoxFuture<'_, Result<ParamMap, String>> {
            Box::pin(async move { Ok(parameters) })
        }
    }

    #[tokio::test]
    async fn register_and_execute() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool), false).unwrap();

        let tool = registry.get("echo").unwrap();
        let mut params = ParamMap::new();
        params.insert("x".into(), serde_json::json!(1));
        let out = tool.execute(params.clone()).await.unwrap();
        assert_eq!(out, params);
    }

    #[test]
    fn duplicate_register_fails_without_overwrite() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool), false).unwrap();
        let err = registry.register(Arc::new(EchoTool), false).unwrap_err();
        assert!(matches!(err, ToolRegistryError::AlreadyRegistered(_)));
    }

    #[test]
    fn duplicate_register_succeeds_with_overwrite() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool), false).unwrap();
        registry.register(Arc::new(EchoTool), true).unwrap();
    }

    #[test]
    fn get_unknown_fails_with_known_list() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool), false).unwrap();
        let err = registry.get("missing").unwrap_err();
        match err {
            ToolRegistryError::NotFound { name, known } => {
                assert_eq!(name, "missing");
                assert_eq!(known, "echo");
            }
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn unregister_removes_tool() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool), false).unwrap();
        registry.unregister("echo");
        assert!(registry.get("echo").is_err());
    }

    #[test]
    fn list_returns_name_and_description() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool), false).unwrap();
        let list = registry.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "echo");
        assert_eq!(list[0].description, "returns its input unchanged");
    }
}
