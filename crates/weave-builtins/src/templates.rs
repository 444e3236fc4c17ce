//! Prebuilt [`WorkflowRequest`]s, consumed by `GET /workflows/templates/{name}`
//! and by `weave-cli`'s test fixtures.

use weave_core::model::{AgentSpec, ParamMap, WorkflowRequest};

/// Name → builder, used by the HTTP/CLI layers to resolve `{name}` to a request.
pub fn get(name: &str) -> Option<WorkflowRequest> {
    match name {
        "calculator-chain" => Some(calculator_chain()),
        "diamond-demo" => Some(diamond_demo()),
        _ => None,
    }
}

/// All known template names, in a stable order.
pub fn names() -> Vec<&'static str> {
    vec!["calculator-chain", "diamond-demo"]
}

fn config(pairs: &[(&str, serde_json::Value)]) -> ParamMap {
    let mut map = ParamMap::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

/// Spec §8 scenario 1: a linear chain, A(config value=10) -> B(add const=5).
pub fn calculator_chain() -> WorkflowRequest {
    WorkflowRequest {
        workflow_id: None,
        initial_input: ParamMap::new(),
        agents: vec![
            AgentSpec {
                agent_id: "a".into(),
                agent_type: "calculator".into(),
                inputs: vec![],
                config: config(&[("value", serde_json::json!(10))]),
                max_retries: None,
                timeout_seconds: None,
            },
            AgentSpec {
                agent_id: "b".into(),
                agent_type: "calculator".into(),
                inputs: vec!["a".into()],
                config: config(&[("op", serde_json::json!("add")), ("const", serde_json::json!(5))]),
                max_retries: None,
                timeout_seconds: None,
            },
        ],
        continue_on_error: false,
    }
}

/// Spec §8 scenario 2: diamond parallelism, A -> {B, C} -> D.
pub fn diamond_demo() -> WorkflowRequest {
    WorkflowRequest {
        workflow_id: None,
        initial_input: ParamMap::new(),
        agents: vec![
            AgentSpec {
                agent_id: "a".into(),
                agent_type: "calculator".into(),
                inputs: vec![],
                config: config(&[("value", serde_json::json!(2))]),
                max_retries: None,
                timeout_seconds: None,
            },
            AgentSpec {
                agent_id: "b".into(),
                agent_type: "calculator".into(),
                inputs: vec!["a".into()],
                config: config(&[("op", serde_json::json!("mul")), ("const", serde_json::json!(3))]),
                max_retries: None,
                timeout_seconds: None,
            },
            AgentSpec {
                agent_id: "c".into(),
                agent_type: "calculator".into(),
                inputs: vec!["a".into()],
                config: config(&[("op", serde_json::json!("add")), ("const", serde_json::json!(10))]),
                max_retries: None,
                timeout_seconds: None,
            },
            AgentSpec {
                agent_id: "d".into(),
                agent_type: "calculator".into(),
                inputs: vec!["b".into(), "c".into()],
                config: config(&[("op", serde_json::json!("add"))]),
                max_retries: None,
                timeout_seconds: None,
            },
        ],
        continue_on_error: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_templates_resolve() {
        assert!(get("calculator-chain").is_some());
        assert!(get("diamond-demo").is_some());
    }

    #[test]
    fn unknown_template_is_none() {
        assert!(get("does-not-exist").is_none());
    }

    #[test]
    fn names_lists_every_known_template() {
        let all = names();
        assert_eq!(all.len(), 2);
        for name in all {
            assert!(get(name).is_some());
        }
    }
}
