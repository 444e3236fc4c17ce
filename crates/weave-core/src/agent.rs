//! Agent contract, the tool-backed default implementation, and the
//! process-wide agent-type registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::model::{AgentSpec, ParamMap};
use crate::tool::{BoxFuture, Tool};

/// Capability set every agent exposes: identity plus `run`.
///
/// [`ToolBackedAgent`] wraps a [`Tool`]; custom agents may bypass tools
/// entirely and compute directly, as long as they obey this same contract.
pub trait Agent: Send + Sync {
    fn agent_id(&self) -> &str;
    fn agent_type(&self) -> &str;
    fn max_retries(&self) -> u32;
    fn timeout_seconds(&self) -> f64;

    /// Run the agent against the engine-assembled input mapping (§4.3):
    /// `initial_input` for source agents, or `{upstream_id: upstream_output}`
    /// otherwise. Implementations are responsible for merging their own
    /// `config` over this mapping per the input composition rule.
    fn run(&self, inputs: ParamMap) -> BoxFuture<'_, Result<ParamMap, String>>;
}

/// Merge `config` over `inputs`, with `config` winning on key collisions —
/// the input composition rule from §4.3, normative for every agent that
/// delegates to a tool.
pub fn compose_parameters(config: &ParamMap, inputs: &ParamMap) -> ParamMap {
    let mut merged = inputs.clone();
    for (k, v) in config {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// An agent that delegates its work to a registered [`Tool`].
pub struct ToolBackedAgent {
    agent_id: String,
    agent_type: String,
    config: ParamMap,
    max_retries: u32,
    timeout_seconds: f64,
    tool: Arc<dyn Tool>,
}

impl ToolBackedAgent {
    /// `spec` is expected to already have passed through
    /// `AgentSpec::with_engine_defaults`; the fallbacks here only guard
    /// direct construction that bypasses the engine.
    pub fn new(spec: &AgentSpec, tool: Arc<dyn Tool>) -> Self {
        Self {
            agent_id: spec.agent_id.clone(),
            agent_type: spec.agent_type.clone(),
            config: spec.config.clone(),
            max_retries: spec.max_retries.unwrap_or(3),
            timeout_seconds: spec.timeout_seconds.unwrap_or(30.0),
            tool,
        }
    }
}

impl Agent for ToolBackedAgent {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    fn agent_type(&self) -> &str {
        &self.agent_type
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn timeout_seconds(&self) -> f64 {
        self.timeout_seconds
    }

    fn run(&self, inputs: ParamMap) -> BoxFuture<'_, Result<ParamMap, String>> {
        let parameters = compose_parameters(&self.config, &inputs);
        self.tool.execute(parameters)
    }
}

/// Builds an [`Agent`] from an [`AgentSpec`], given the spec's `agent_type`
/// has already been resolved against the registry.
pub type AgentFactory = Arc<dyn Fn(&AgentSpec) -> Result<Arc<dyn Agent>, String> + Send + Sync>;

#[derive(Debug, Error)]
pub enum AgentRegistryError {
    #[error("agent type '{0}' is already registered (pass overwrite=true to replace it)")]
    AlreadyRegistered(String),

    #[error("unknown agent type '{agent_type}'. Known agent types: {known}")]
    NotFound { agent_type: String, known: String },

    #[error("factory for agent type '{agent_type}' failed: {reason}")]
    FactoryFailed { agent_type: String, reason: String },
}

/// Name → description pair, as returned by [`AgentRegistry::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTypeInfo {
    pub agent_type: String,
    pub description: String,
}

/// Process-wide `agent_type -> factory` mapping, symmetric to [`crate::tool::ToolRegistry`].
#[derive(Default)]
pub struct AgentRegistry {
    factories: RwLock<HashMap<String, (AgentFactory, String)>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `agent_type`, with a human-readable description.
    pub fn register(
        &self,
        agent_type: impl Into<String>,
        description: impl Into<String>,
        factory: AgentFactory,
        overwrite: bool,
    ) -> Result<(), AgentRegistryError> {
        let mut factories = self.factories.write().expect("agent registry lock poisoned");
        let agent_type = agent_type.into();
        if !overwrite && factories.contains_key(&agent_type) {
            return Err(AgentRegistryError::AlreadyRegistered(agent_type));
        }
        factories.insert(agent_type, (factory, description.into()));
        Ok(())
    }

    /// Instantiate an agent from a spec, resolving `agent_type` in the registry.
    pub fn create(&self, spec: &AgentSpec) -> Result<Arc<dyn Agent>, AgentRegistryError> {
        let factories = self.factories.read().expect("agent registry lock poisoned");
        let (factory, _) =
            factories
                .get(&spec.agent_type)
                .ok_or_else(|| AgentRegistryError::NotFound {
                    agent_type: spec.agent_type.clone(),
                    known: known_types(factories.keys()),
                })?;
        factory(spec).map_err(|reason| AgentRegistryError::FactoryFailed {
            agent_type: spec.agent_type.clone(),
            reason,
        })
    }

    /// List all registered agent types. Order is unspecified.
    pub fn list(&self) -> Vec<AgentTypeInfo> {
        let factories = self.factories.read().expect("agent registry lock poisoned");
        factories
            .iter()
            .map(|(agent_type, (_, description))| AgentTypeInfo {
                agent_type: agent_type.clone(),
                description: description.clone(),
            })
            .collect()
    }

    /// Remove a factory by agent type. No-op if absent.
    pub fn unregister(&self, agent_type: &str) {
        let mut factories = self.factories.write().expect("agent registry lock poisoned");
        factories.remove(agent_type);
    }

    /// True if `agent_type` resolves in this registry.
    pub fn contains(&self, agent_type: &str) -> bool {
        let factories = self.factories.read().expect("agent registry lock poisoned");
        factories.contains_key(agent_type)
    }
}

fn known_types<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let mut names: Vec<&str> = names.map(String::as_str).collect();
    names.sort_unstable();
    names.join(", ")
}
