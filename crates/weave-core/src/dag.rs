//! Workflow DAG: validation and layering over a set of [`AgentSpec`]s.

use std::collections::{HashMap, HashSet};

use crate::model::AgentSpec;
use crate::{Result, WeaveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A validated, topologically-layered DAG of agent specs.
pub struct WorkflowDag {
    specs: HashMap<String, AgentSpec>,
    layers: Vec<Vec<String>>,
}

impl WorkflowDag {
    /// Build and validate a DAG from a list of agent specs.
    ///
    /// Validation order (§4.5): duplicate ids, dangling dependencies, cycles.
    /// Order within a layer (and DFS traversal order) follows the position
    /// each agent holds in `agents`, not `agent_id` sort order.
    pub fn new(agents: &[AgentSpec]) -> Result<Self> {
        let mut specs: HashMap<String, AgentSpec> = HashMap::new();
        let mut declaration_index: HashMap<String, usize> = HashMap::new();
        for (idx, spec) in agents.iter().enumerate() {
            if spec.agent_id.is_empty() {
                return Err(WeaveError::Validation("agent_id must not be empty".into()));
            }
            if specs.insert(spec.agent_id.clone(), spec.clone()).is_some() {
                return Err(WeaveError::Validation(format!(
                    "duplicate agent_id '{}'",
                    spec.agent_id
                )));
            }
            declaration_index.insert(spec.agent_id.clone(), idx);
        }

        for spec in agents {
            for dep in &spec.inputs {
                if !specs.contains_key(dep) {
                    return Err(WeaveError::Validation(format!(
                        "agent '{}' depends on unknown agent '{dep}'",
                        spec.agent_id
                    )));
                }
            }
            if let Some(t) = spec.timeout_seconds {
                if t <= 0.0 {
                    return Err(WeaveError::Validation(format!(
                        "agent '{}' has non-positive timeout_seconds",
                        spec.agent_id
                    )));
                }
            }
        }

        detect_cycle(&specs, &declaration_index)?;
        let layers = compute_layers(&specs, &declaration_index);

        Ok(Self { specs, layers })
    }

    /// The canonical topological partition: layer 0 has no dependencies,
    /// layer k+1's nodes depend only on nodes in layers ≤ k.
    pub fn layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    pub fn spec(&self, agent_id: &str) -> Option<&AgentSpec> {
        self.specs.get(agent_id)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// True iff every predecessor of `agent_id` is already in `completed`.
    pub fn is_ready(&self, agent_id: &str, completed: &HashSet<String>) -> bool {
        match self.specs.get(agent_id) {
            Some(spec) => spec.inputs.iter().all(|dep| completed.contains(dep)),
            None => false,
        }
    }
}

/// DFS with gray/black coloring; on a back-edge, fails naming the edge.
fn detect_cycle(specs: &HashMap<String, AgentSpec>, declaration_index: &HashMap<String, usize>) -> Result<()> {
    let mut color: HashMap<&str, Color> = specs.keys().map(|k| (k.as_str(), Color::White)).collect();
    let mut order: Vec<&str> = specs.keys().map(String::as_str).collect();
    order.sort_unstable_by_key(|id| declaration_index[*id]);

    for start in order {
        if color[start] == Color::White {
            visit(start, specs, declaration_index, &mut color)?;
        }
    }
    Ok(())
}

fn visit<'a>(
    node: &'a str,
    specs: &'a HashMap<String, AgentSpec>,
    declaration_index: &HashMap<String, usize>,
    color: &mut HashMap<&'a str, Color>,
) -> Result<()> {
    color.insert(node, Color::Gray);
    let mut deps: Vec<&str> = specs[node].inputs.iter().map(String::as_str).collect();
    deps.sort_unstable_by_key(|id| declaration_index[*id]);
    for dep in deps {
        match color.get(dep).copied().unwrap_or(Color::White) {
            Color::White => visit(dep, specs, declaration_index, color)?,
            Color::Gray => {
                return Err(WeaveError::Validation(format!(
                    "workflow contains a cycle: edge '{node}' -> '{dep}'"
                )))
            }
            Color::Black => {}
        }
    }
    color.insert(node, Color::Black);
    Ok(())
}

/// Kahn-style layering: layer 0 = in-degree-0 nodes, layer k+1 = nodes whose
/// predecessors all landed in layers ≤ k. Within a layer, order is input
/// declaration order — the position each agent holds in the submitted
/// `WorkflowRequest.agents` list.
fn compute_layers(specs: &HashMap<String, AgentSpec>, declaration_index: &HashMap<String, usize>) -> Vec<Vec<String>> {
    let mut declaration_order: Vec<&str> = specs.keys().map(String::as_str).collect();
    declaration_order.sort_unstable_by_key(|id| declaration_index[*id]);

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (id, spec) in specs {
        in_degree.entry(id.as_str()).or_insert(0);
        dependents.entry(id.as_str()).or_default();
        for dep in &spec.inputs {
            *in_degree.entry(id.as_str()).or_insert(0) += 1;
            dependents.entry(dep.as_str()).or_default().push(id.as_str());
        }
    }

    let mut layers: Vec<Vec<String>> = Vec::new();
    let mut ready: Vec<&str> = declaration_order
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();

    while !ready.is_empty() {
        let current: Vec<String> = ready.iter().map(|s| s.to_string()).collect();
        let mut next: Vec<&str> = Vec::new();

        for id in &ready {
            if let Some(deps) = dependents.get(id) {
                for dependent in deps {
                    let deg = in_degree.get_mut(dependent).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        next.push(dependent);
                    }
                }
            }
        }

        layers.push(current);
        next.sort_unstable_by_key(|id| declaration_index[*id]);
        ready = next;
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParamMap;

    fn spec(id: &str, inputs: &[&str]) -> AgentSpec {
        AgentSpec {
            agent_id: id.into(),
            agent_type: "noop".into(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            config: ParamMap::new(),
            max_retries: Some(0),
            timeout_seconds: Some(30.0),
        }
    }

    #[test]
    fn linear_chain_layers() {
        let dag = WorkflowDag::new(&[spec("a", &[]), spec("b", &["a"]), spec("c", &["b"])]).unwrap();
        assert_eq!(
            dag.layers(),
            &[vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn diamond_layers() {
        let dag = WorkflowDag::new(&[
            spec("a", &[]),
            spec("b", &["a"]),
            spec("c", &["a"]),
            spec("d", &["b", "c"]),
        ])
        .unwrap();
        let layers = dag.layers();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0], vec!["a".to_string()]);
        assert_eq!(layers[1], vec!["b".to_string(), "c".to_string()]);
        assert_eq!(layers[2], vec!["d".to_string()]);
    }

    #[test]
    fn layer_monotonicity_and_completeness() {
        let specs = [
            spec("a", &[]),
            spec("b", &["a"]),
            spec("c", &["a"]),
            spec("d", &["b", "c"]),
        ];
        let dag = WorkflowDag::new(&specs).unwrap();
        let mut layer_of: HashMap<&str, usize> = HashMap::new();
        for (idx, layer) in dag.layers().iter().enumerate() {
            for id in layer {
                layer_of.insert(id.as_str(), idx);
            }
        }
        for spec in &specs {
            for dep in &spec.inputs {
                assert!(layer_of[dep.as_str()] < layer_of[spec.agent_id.as_str()]);
            }
        }
        let total: usize = dag.layers().iter().map(|l| l.len()).sum();
        assert_eq!(total, specs.len());
    }

    #[test]
    fn duplicate_agent_id_rejected() {
        let err = WorkflowDag::new(&[spec("a", &[]), spec("a", &[])]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn dangling_dependency_rejected() {
        let err = WorkflowDag::new(&[spec("a", &["missing"])]).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn cycle_rejected_naming_an_edge() {
        let err = WorkflowDag::new(&[spec("a", &["b"]), spec("b", &["a"])]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cycle"));
        assert!(msg.contains("a") && msg.contains("b"));
    }

    #[test]
    fn non_positive_timeout_rejected() {
        let mut s = spec("a", &[]);
        s.timeout_seconds = Some(0.0);
        let err = WorkflowDag::new(&[s]).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn unset_timeout_is_not_rejected() {
        let mut s = spec("a", &[]);
        s.timeout_seconds = None;
        WorkflowDag::new(&[s]).unwrap();
    }

    #[test]
    fn layer_order_follows_declaration_not_alphabetical() {
        let dag = WorkflowDag::new(&[spec("z", &[]), spec("a", &[])]).unwrap();
        assert_eq!(dag.layers()[0], vec!["z".to_string(), "a".to_string()]);
    }

    #[test]
    fn is_ready_respects_completed_set() {
        let dag = WorkflowDag::new(&[spec("a", &[]), spec("b", &["a"])]).unwrap();
        let mut completed = HashSet::new();
        assert!(!dag.is_ready("b", &completed));
        completed.insert("a".to_string());
        assert!(dag.is_ready("b", &completed));
    }
}
