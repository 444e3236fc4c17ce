//! The four demo tools/agents described by the spec as external
//! collaborators (arithmetic, static data fetch, list aggregation, chart
//! series shaping), plus a handful of prebuilt workflow templates.
//!
//! Every built-in is tool-backed: one [`weave_core::tool::Tool`] impl per
//! module, registered under an identically-named `agent_type` that
//! constructs a [`weave_core::agent::ToolBackedAgent`] around it.

pub mod calculator;
pub mod chart_series;
pub mod list_aggregate;
pub mod static_fetch;
pub mod templates;

use std::sync::Arc;

use weave_core::agent::{Agent, AgentRegistry};
use weave_core::model::AgentSpec;
use weave_core::tool::{Tool, ToolRegistry};

/// Register all four built-in tools into `tools` and their matching
/// tool-backed agent factories into `agents`. Call once at startup.
pub fn register_all(tools: &ToolRegistry, agents: &AgentRegistry) -> Result<(), String> {
    register_one(tools, agents, Arc::new(calculator::CalculatorTool))?;
    register_one(tools, agents, Arc::new(static_fetch::StaticFetchTool))?;
    register_one(tools, agents, Arc::new(list_aggregate::ListAggregateTool))?;
    register_one(tools, agents, Arc::new(chart_series::ChartSeriesTool))?;
    Ok(())
}

fn register_one(
    tools: &ToolRegistry,
    agents: &AgentRegistry,
    tool: Arc<dyn Tool>,
) -> Result<(), String> {
    let name = tool.name().to_string();
    let description = tool.description().to_string();
    tools
        .register(tool.clone(), false)
        .map_err(|e| e.to_string())?;
    agents
        .register(
            name.clone(),
            description,
            Arc::new(move |spec: &AgentSpec| {
                Ok(Arc::new(weave_core::agent::ToolBackedAgent::new(spec, tool.clone())) as Arc<dyn Agent>)
            }),
            false,
        )
        .map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_populates_both_registries() {
        let tools = ToolRegistry::new();
        let agents = AgentRegistry::new();
        register_all(&tools, &agents).unwrap();

        let tool_names: Vec<String> = tools.list().into_iter().map(|t| t.name).collect();
        assert!(tool_names.contains(&"calculator".to_string()));
        assert!(tool_names.contains(&"static_fetch".to_string()));
        assert!(tool_names.contains(&"list_aggregate".to_string()));
        assert!(tool_names.contains(&"chart_series".to_string()));

        let agent_types: Vec<String> = agents.list().into_iter().map(|a| a.agent_type).collect();
        assert_eq!(tool_names.len(), agent_types.len());
        for name in &tool_names {
            assert!(agent_types.contains(name));
        }
    }

    #[test]
    fn register_all_is_idempotent_failure_without_overwrite() {
        let tools = ToolRegistry::new();
        let agents = AgentRegistry::new();
        register_all(&tools, &agents).unwrap();
        assert!(register_all(&tools, &agents).is_err());
    }
}
