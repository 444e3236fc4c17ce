//! Shared application state handed to every route handler.

use std::sync::Arc;

use weave_core::agent::AgentRegistry;
use weave_core::engine::ExecutionEngine;
use weave_core::tool::ToolRegistry;

pub const SERVICE_NAME: &str = "weave";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ExecutionEngine>,
    pub tools: Arc<ToolRegistry>,
    pub agents: Arc<AgentRegistry>,
}

impl AppState {
    pub fn new(engine: Arc<ExecutionEngine>, tools: Arc<ToolRegistry>, agents: Arc<AgentRegistry>) -> Self {
        Self { engine, tools, agents }
    }

    /// Build default state: a fresh tool/agent registry with every
    /// built-in registered, and an engine wired to it.
    pub fn with_builtins(config: weave_core::config::EngineConfig) -> Self {
        let tools = Arc::new(ToolRegistry::new());
        let agents = Arc::new(AgentRegistry::new());
        weave_builtins::register_all(&tools, &agents).expect("built-in registration cannot collide on a fresh registry");
        let engine = Arc::new(ExecutionEngine::new(agents.clone(), config));
        Self::new(engine, tools, agents)
    }
}
