//! Execution engine: drives a workflow layer-by-layer with retry, backoff,
//! timeout, and cooperative cancellation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentRegistry};
use crate::config::EngineConfig;
use crate::dag::WorkflowDag;
use crate::model::{
    assign_workflow_id, AgentResult, AgentSpec, AgentStatus, ParamMap, WorkflowRequest,
    WorkflowResult, WorkflowStatus,
};

/// Per-workflow runtime state: results map, cancellation signal, timestamps.
/// Lives from submission to terminal status; retained afterward in a
/// bounded LRU inside [`ExecutionEngine`] (§3 "Ownership & lifecycle").
struct ExecutionContext {
    workflow_id: String,
    started_at: chrono::DateTime<Utc>,
    agent_results: RwLock<HashMap<String, AgentResult>>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl ExecutionContext {
    fn new(workflow_id: String) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            workflow_id,
            started_at: Utc::now(),
            agent_results: RwLock::new(HashMap::new()),
            cancel_tx,
            cancel_rx,
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    fn snapshot(&self, status: WorkflowStatus, error: Option<String>) -> WorkflowResult {
        let agent_results = self
            .agent_results
            .read()
            .expect("agent_results lock poisoned")
            .clone();
        WorkflowResult {
            workflow_id: self.workflow_id.clone(),
            status,
            agent_results,
            started_at: self.started_at,
            finished_at: if status == WorkflowStatus::Running {
                None
            } else {
                Some(Utc::now())
            },
            error,
        }
    }
}

/// Small, hand-rolled bounded LRU of completed `WorkflowResult`s, keyed by
/// `workflow_id`. Not a persistence layer (Non-goals exclude that) — just
/// bounds memory for a caller that never calls `status()` on old ids.
struct RetentionLru {
    capacity: usize,
    order: VecDeque<String>,
    entries: HashMap<String, WorkflowResult>,
}

impl RetentionLru {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, result: WorkflowResult) {
        let id = result.workflow_id.clone();
        if self.entries.insert(id.clone(), result).is_none() {
            self.order.push_back(id);
        }
        if self.capacity > 0 {
            while self.order.len() > self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }
    }

    fn get(&self, id: &str) -> Option<WorkflowResult> {
        self.entries.get(id).cloned()
    }
}

/// Drives workflows: builds the DAG, schedules layers, enforces per-agent
/// retry/backoff/timeout, supports cancellation, tracks in-flight workflows.
pub struct ExecutionEngine {
    agents: Arc<AgentRegistry>,
    config: EngineConfig,
    active: AsyncMutex<HashMap<String, Arc<ExecutionContext>>>,
    retained: AsyncMutex<RetentionLru>,
}

impl ExecutionEngine {
    pub fn new(agents: Arc<AgentRegistry>, config: EngineConfig) -> Self {
        let capacity = config.engine.retention_capacity;
        Self {
            agents,
            config,
            active: AsyncMutex::new(HashMap::new()),
            retained: AsyncMutex::new(RetentionLru::new(capacity)),
        }
    }

    /// Run a workflow to terminal status. Always returns a `WorkflowResult`;
    /// validation and instantiation failures surface as `status = failed`
    /// with a populated `error`, never as a Rust `Err` (§7).
    pub async fn execute(&self, request: WorkflowRequest) -> WorkflowResult {
        let workflow_id = assign_workflow_id(request.workflow_id.clone());
        let ctx = Arc::new(ExecutionContext::new(workflow_id.clone()));
        self.active
            .lock()
            .await
            .insert(workflow_id.clone(), ctx.clone());

        info!(%workflow_id, agent_count = request.agents.len(), "starting workflow execution");

        let result = self.run(&ctx, &request).await;

        self.active.lock().await.remove(&workflow_id);
        self.retained.lock().await.insert(result.clone());

        info!(%workflow_id, status = ?result.status, "workflow execution finished");
        result
    }

    async fn run(&self, ctx: &ExecutionContext, request: &WorkflowRequest) -> WorkflowResult {
        let resolved_agents: Vec<AgentSpec> = request
            .agents
            .iter()
            .map(|spec| spec.with_engine_defaults(&self.config.engine))
            .collect();

        let dag = match WorkflowDag::new(&resolved_agents) {
            Ok(dag) => dag,
            Err(e) => return ctx.snapshot(WorkflowStatus::Failed, Some(e.to_string())),
        };

        let mut agents: HashMap<String, Arc<dyn Agent>> = HashMap::new();
        for spec in &resolved_agents {
            match self.agents.create(spec) {
                Ok(agent) => {
                    agents.insert(spec.agent_id.clone(), agent);
                }
                Err(e) => return ctx.snapshot(WorkflowStatus::Failed, Some(e.to_string())),
            }
        }

        let mut fail_fast_triggered = false;

        'layers: for (level_idx, layer) in dag.layers().iter().enumerate() {
            if ctx.is_cancelled() {
                debug!(workflow_id = %ctx.workflow_id, level_idx, "cancellation observed at layer boundary");
                break 'layers;
            }

            let (runnable, skipped) = self.partition_layer(ctx, &dag, request, layer);
            for (agent_id, reason) in skipped {
                ctx.agent_results
                    .write()
                    .expect("agent_results lock poisoned")
                    .insert(agent_id.clone(), AgentResult::skipped(agent_id, reason));
            }

            if runnable.is_empty() {
                continue;
            }

            let mut handles: Vec<JoinHandle<AgentResult>> = Vec::with_capacity(runnable.len());
            for agent_id in &runnable {
                let spec = dag.spec(agent_id).expect("spec exists for dag node");
                let agent = agents
                    .get(agent_id)
                    .expect("agent instantiated for every spec")
                    .clone();
                let inputs = assemble_inputs(
                    spec,
                    &request.initial_input,
                    &ctx.agent_results.read().expect("agent_results lock poisoned"),
                );
                let cancel_rx = ctx.cancel_rx.clone();
                let backoff_base = self.config.engine.backoff_base_seconds;
                let backoff_cap = self.config.engine.backoff_cap_seconds;

                // Launch every task in the layer before awaiting any (§4.6 step 3b).
                handles.push(tokio::spawn(async move {
                    execute_agent_with_retry(agent.as_ref(), inputs, cancel_rx, backoff_base, backoff_cap)
                        .await
                }));
            }

            let outcomes = join_all(handles).await;
            let mut layer_had_failure = false;
            for outcome in outcomes {
                let result = match outcome {
                    Ok(result) => result,
                    Err(join_err) => AgentResult {
                        agent_id: "<unknown>".into(),
                        status: AgentStatus::Failed,
                        output: ParamMap::new(),
                        error: Some(format!("agent task panicked: {join_err}")),
                        attempts: 0,
                        duration_seconds: 0.0,
                    },
                };
                if matches!(result.status, AgentStatus::Failed | AgentStatus::Timeout) {
                    layer_had_failure = true;
                }
                ctx.agent_results
                    .write()
                    .expect("agent_results lock poisoned")
                    .insert(result.agent_id.clone(), result);
            }

            if layer_had_failure && !request.continue_on_error {
                warn!(workflow_id = %ctx.workflow_id, level_idx, "fail-fast: halting after layer with a non-success result");
                fail_fast_triggered = true;
                break 'layers;
            }
        }

        self.finalize(ctx, request, fail_fast_triggered)
    }

    /// Split a layer into agents that can run now and agents that must be
    /// skipped because an upstream dependency already failed/timed
    /// out/cancelled (continue-on-error mode only, §4.6).
    fn partition_layer(
        &self,
        ctx: &ExecutionContext,
        dag: &WorkflowDag,
        request: &WorkflowRequest,
        layer: &[String],
    ) -> (Vec<String>, Vec<(String, String)>) {
        if !request.continue_on_error {
            return (layer.to_vec(), Vec::new());
        }
        let results = ctx.agent_results.read().expect("agent_results lock poisoned");
        let mut runnable = Vec::new();
        let mut skipped = Vec::new();
        for agent_id in layer {
            let spec = dag.spec(agent_id).expect("spec exists for dag node");
            let blocked = spec.inputs.iter().any(|dep| {
                results
                    .get(dep)
                    .map(|r| r.status.blocks_downstream())
                    .unwrap_or(false)
            });
            if blocked {
                skipped.push((agent_id.clone(), "skipped: upstream dependency failed".to_string()));
            } else {
                runnable.push(agent_id.clone());
            }
        }
        (runnable, skipped)
    }

    fn finalize(
        &self,
        ctx: &ExecutionContext,
        request: &WorkflowRequest,
        fail_fast_triggered: bool,
    ) -> WorkflowResult {
        if ctx.is_cancelled() {
            return ctx.snapshot(WorkflowStatus::Cancelled, None);
        }

        let results = ctx.agent_results.read().expect("agent_results lock poisoned");

        if request.continue_on_error {
            let any_success = results.values().any(|r| r.status.is_success());
            let any_non_success = results.values().any(|r| !r.status.is_success());
            let status = if !any_non_success {
                WorkflowStatus::Success
            } else if any_success {
                WorkflowStatus::Partial
            } else {
                WorkflowStatus::Failed
            };
            drop(results);
            return ctx.snapshot(status, None);
        }

        let status = if fail_fast_triggered {
            WorkflowStatus::Failed
        } else {
            WorkflowStatus::Success
        };
        drop(results);
        ctx.snapshot(
            status,
            if status == WorkflowStatus::Failed {
                Some("one or more agents failed; downstream agents were not started".into())
            } else {
                None
            },
        )
    }

    /// Point-in-time snapshot of a workflow's status, active or completed.
    pub async fn status(&self, workflow_id: &str) -> Option<WorkflowResult> {
        if let Some(ctx) = self.active.lock().await.get(workflow_id) {
            return Some(ctx.snapshot(WorkflowStatus::Running, None));
        }
        self.retained.lock().await.get(workflow_id)
    }

    /// Request cooperative cancellation. Idempotent; returns whether an
    /// active workflow was found.
    pub async fn cancel(&self, workflow_id: &str) -> bool {
        match self.active.lock().await.get(workflow_id) {
            Some(ctx) => {
                ctx.cancel();
                true
            }
            None => false,
        }
    }

    /// All currently in-flight workflow ids.
    pub async fn list_active(&self) -> Vec<String> {
        self.active.lock().await.keys().cloned().collect()
    }
}

/// Assemble the input mapping the engine hands to `Agent::run` (§4.3):
/// `initial_input` for source agents, else `{upstream_id: upstream_output}`.
fn assemble_inputs(
    spec: &AgentSpec,
    initial_input: &ParamMap,
    results: &HashMap<String, AgentResult>,
) -> ParamMap {
    if spec.is_source() {
        return initial_input.clone();
    }
    let mut map = ParamMap::new();
    for dep in &spec.inputs {
        if let Some(result) = results.get(dep) {
            map.insert(dep.clone(), Value::Object(result.output.clone()));
        }
    }
    map
}

/// Exponential backoff with base `base_seconds` and exponent `attempt-1`,
/// capped at `cap_seconds` (§4.6 backoff schedule, normative).
fn backoff_delay(attempt: u32, base_seconds: f64, cap_seconds: f64) -> Duration {
    let exp = 2f64.powi((attempt.saturating_sub(1)) as i32);
    Duration::from_secs_f64((base_seconds * exp).min(cap_seconds))
}

/// Run a single agent to a terminal `AgentResult`, retrying on failure or
/// timeout up to `max_retries`, with cancellation observed between and
/// during attempts.
async fn execute_agent_with_retry(
    agent: &dyn Agent,
    inputs: ParamMap,
    mut cancel_rx: watch::Receiver<bool>,
    backoff_base: f64,
    backoff_cap: f64,
) -> AgentResult {
    let agent_id = agent.agent_id().to_string();
    let max_retries = agent.max_retries();
    let timeout = Duration::from_secs_f64(agent.timeout_seconds().max(0.0));
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        if *cancel_rx.borrow() {
            return terminal(agent_id, AgentStatus::Cancelled, attempts, start, None, "cancelled before attempt");
        }
        attempts += 1;

        let outcome = tokio::select! {
            res = tokio::time::timeout(timeout, agent.run(inputs.clone())) => Outcome::Attempt(res),
            _ = cancel_rx.changed() => Outcome::Cancelled,
        };

        match outcome {
            Outcome::Cancelled => {
                return terminal(agent_id, AgentStatus::Cancelled, attempts, start, None, "cancelled mid-flight");
            }
            Outcome::Attempt(Ok(Ok(output))) => {
                return AgentResult {
                    agent_id,
                    status: AgentStatus::Success,
                    output,
                    error: None,
                    attempts,
                    duration_seconds: start.elapsed().as_secs_f64(),
                };
            }
            Outcome::Attempt(Ok(Err(message))) => {
                if attempts > max_retries {
                    return terminal(
                        agent_id,
                        AgentStatus::Failed,
                        attempts,
                        start,
                        None,
                        &format!("failed after {attempts} attempts: {message}"),
                    );
                }
            }
            Outcome::Attempt(Err(_elapsed)) => {
                if attempts > max_retries {
                    return terminal(
                        agent_id,
                        AgentStatus::Timeout,
                        attempts,
                        start,
                        None,
                        &format!("timeout after {attempts} attempts"),
                    );
                }
            }
        }

        let delay = backoff_delay(attempts, backoff_base, backoff_cap);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel_rx.changed() => {
                return terminal(agent_id, AgentStatus::Cancelled, attempts, start, None, "cancelled during backoff");
            }
        }
    }
}

enum Outcome {
    Attempt(Result<Result<ParamMap, String>, tokio::time::error::Elapsed>),
    Cancelled,
}

fn terminal(
    agent_id: String,
    status: AgentStatus,
    attempts: u32,
    start: Instant,
    output: Option<ParamMap>,
    error: &str,
) -> AgentResult {
    AgentResult {
        agent_id,
        status,
        output: output.unwrap_or_default(),
        error: Some(error.to_string()),
        attempts,
        duration_seconds: start.elapsed().as_secs_f64(),
    }
}
