//! Workflow data model: the types clients submit and the results they get back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::EngineSection;

/// A free-form string-keyed mapping, the transport type for config, inputs,
/// and outputs throughout the engine (spec's "dynamic config mapping").
pub type ParamMap = Map<String, Value>;

/// Declarative element of a workflow: one agent and its place in the DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub agent_id: String,
    pub agent_type: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub config: ParamMap,
    /// `None` defers to the engine's configured default
    /// (`EngineConfig.engine.default_max_retries`, §3/§9) — resolved by
    /// [`AgentSpec::with_engine_defaults`] before the DAG ever sees it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// `None` defers to the engine's configured default
    /// (`EngineConfig.engine.default_timeout_seconds`, §3/§9).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
}

impl AgentSpec {
    /// True if this agent has no upstream dependencies (a "source" agent).
    pub fn is_source(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Fill in `max_retries`/`timeout_seconds` from the engine's configured
    /// defaults wherever the spec left them unset. The engine calls this on
    /// every submitted spec before validating or instantiating it, so a
    /// deployer's `weave.toml` `default_max_retries`/`default_timeout_seconds`
    /// actually reaches agent execution instead of being shadowed by a
    /// hardcoded constant.
    pub fn with_engine_defaults(&self, defaults: &EngineSection) -> AgentSpec {
        AgentSpec {
            max_retries: Some(self.max_retries.unwrap_or(defaults.default_max_retries)),
            timeout_seconds: Some(self.timeout_seconds.unwrap_or(defaults.default_timeout_seconds)),
            ..self.clone()
        }
    }
}

/// A workflow submission: the DAG of agents plus the input fed to source agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub initial_input: ParamMap,
    pub agents: Vec<AgentSpec>,
    /// Opt-in continue-on-error mode producing `partial` status (§9 open question).
    #[serde(default)]
    pub continue_on_error: bool,
}

/// Terminal (or in-flight) state of a single agent's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Running,
    Success,
    Failed,
    Timeout,
    Cancelled,
    Skipped,
}

impl AgentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AgentStatus::Pending | AgentStatus::Running)
    }

    pub fn is_success(self) -> bool {
        matches!(self, AgentStatus::Success)
    }

    /// Non-success terminal states that block downstream agents under
    /// continue-on-error mode (failed, timed out, or cancelled upstream).
    pub fn blocks_downstream(self) -> bool {
        matches!(
            self,
            AgentStatus::Failed | AgentStatus::Timeout | AgentStatus::Cancelled
        )
    }
}

/// Result of executing (or skipping) a single agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_id: String,
    pub status: AgentStatus,
    #[serde(default)]
    pub output: ParamMap,
    pub error: Option<String>,
    pub attempts: u32,
    pub duration_seconds: f64,
}

impl AgentResult {
    pub fn skipped(agent_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            status: AgentStatus::Skipped,
            output: ParamMap::new(),
            error: Some(reason.into()),
            attempts: 0,
            duration_seconds: 0.0,
        }
    }
}

/// Aggregate status of a whole workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Success,
    Partial,
    Failed,
    Cancelled,
    Running,
}

/// Full result of a workflow run, queryable mid-flight and after completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub status: WorkflowStatus,
    pub agent_results: HashMap<String, AgentResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl WorkflowResult {
    pub fn new(workflow_id: String) -> Self {
        Self {
            workflow_id,
            status: WorkflowStatus::Running,
            agent_results: HashMap::new(),
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }
}

/// Assign a random workflow id when the request doesn't supply one.
pub fn assign_workflow_id(requested: Option<String>) -> String {
    requested.unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_spec_defaults_to_unset() {
        let json = serde_json::json!({
            "agent_id": "a",
            "agent_type": "calculator",
        });
        let spec: AgentSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.max_retries, None);
        assert_eq!(spec.timeout_seconds, None);
        assert!(spec.is_source());
    }

    #[test]
    fn with_engine_defaults_fills_unset_fields_from_engine_config() {
        let defaults = EngineSection {
            default_max_retries: 7,
            default_timeout_seconds: 42.0,
            ..EngineSection::default()
        };
        let spec = AgentSpec {
            agent_id: "a".into(),
            agent_type: "calculator".into(),
            inputs: vec![],
            config: ParamMap::new(),
            max_retries: None,
            timeout_seconds: None,
        };
        let resolved = spec.with_engine_defaults(&defaults);
        assert_eq!(resolved.max_retries, Some(7));
        assert_eq!(resolved.timeout_seconds, Some(42.0));
    }

    #[test]
    fn with_engine_defaults_leaves_explicit_values_alone() {
        let defaults = EngineSection::default();
        let spec = AgentSpec {
            agent_id: "a".into(),
            agent_type: "calculator".into(),
            inputs: vec![],
            config: ParamMap::new(),
            max_retries: Some(1),
            timeout_seconds: Some(9.0),
        };
        let resolved = spec.with_engine_defaults(&defaults);
        assert_eq!(resolved.max_retries, Some(1));
        assert_eq!(resolved.timeout_seconds, Some(9.0));
    }

    #[test]
    fn workflow_request_round_trip() {
        let req = WorkflowRequest {
            workflow_id: Some("wf-1".into()),
            initial_input: ParamMap::new(),
            agents: vec![AgentSpec {
                agent_id: "a".into(),
                agent_type: "calculator".into(),
                inputs: vec![],
                config: ParamMap::new(),
                max_retries: Some(2),
                timeout_seconds: Some(5.0),
            }],
            continue_on_error: false,
        };
        let json = serde_json::to_string(&req).unwrap();
        let restored: WorkflowRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.workflow_id.as_deref(), Some("wf-1"));
        assert_eq!(restored.agents.len(), 1);
        assert_eq!(restored.agents[0].max_retries, Some(2));
    }

    #[test]
    fn status_tokens_are_snake_case() {
        let s = serde_json::to_value(AgentStatus::Timeout).unwrap();
        assert_eq!(s, serde_json::json!("timeout"));
        let s = serde_json::to_value(WorkflowStatus::Partial).unwrap();
        assert_eq!(s, serde_json::json!("partial"));
    }

    #[test]
    fn blocks_downstream_covers_failed_timeout_cancelled() {
        assert!(AgentStatus::Failed.blocks_downstream());
        assert!(AgentStatus::Timeout.blocks_downstream());
        assert!(AgentStatus::Cancelled.blocks_downstream());
        assert!(!AgentStatus::Success.blocks_downstream());
        assert!(!AgentStatus::Skipped.blocks_downstream());
    }
}
