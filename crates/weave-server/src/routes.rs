//! Route handlers for the HTTP surface described in spec §6.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tracing::{info, warn};

use weave_core::model::{WorkflowRequest, WorkflowResult, WorkflowStatus};

use crate::state::{AppState, SERVICE_NAME, SERVICE_VERSION};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/agents", get(list_agents))
        .route("/tools", get(list_tools))
        .route("/workflows", post(submit_workflow))
        .route("/workflows/:id", get(get_workflow))
        .route("/workflows/:id/cancel", post(cancel_workflow))
        .route("/workflows/templates/:name", get(get_template))
        .with_state(state)
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: SERVICE_NAME,
        version: SERVICE_VERSION,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct AgentTypeResponse {
    agent_type: String,
    description: String,
}

async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentTypeResponse>> {
    let mut list: Vec<AgentTypeResponse> = state
        .agents
        .list()
        .into_iter()
        .map(|info| AgentTypeResponse {
            agent_type: info.agent_type,
            description: info.description,
        })
        .collect();
    list.sort_by(|a, b| a.agent_type.cmp(&b.agent_type));
    Json(list)
}

#[derive(Serialize)]
struct ToolResponse {
    name: String,
    description: String,
}

async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolResponse>> {
    let mut list: Vec<ToolResponse> = state
        .tools
        .list()
        .into_iter()
        .map(|info| ToolResponse {
            name: info.name,
            description: info.description,
        })
        .collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    Json(list)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

/// A workflow result that never instantiated any agent indicates the
/// request failed validation (§4.6 step 2/§7) rather than failing during
/// execution; the engine never raises validation as a Rust `Err` (it's
/// always folded into a terminal `WorkflowResult`), so the HTTP layer
/// distinguishes the two cases this way before choosing a status code.
fn is_validation_failure(result: &WorkflowResult) -> bool {
    result.status == WorkflowStatus::Failed && result.agent_results.is_empty() && result.error.is_some()
}

async fn submit_workflow(
    State(state): State<AppState>,
    Json(request): Json<WorkflowRequest>,
) -> axum::response::Response {
    info!(agent_count = request.agents.len(), "received workflow submission");
    let result = state.engine.execute(request).await;
    if is_validation_failure(&result) {
        warn!(workflow_id = %result.workflow_id, error = ?result.error, "workflow rejected at validation");
        return error_response(
            StatusCode::BAD_REQUEST,
            result.error.unwrap_or_else(|| "validation error".into()),
        );
    }
    Json(result).into_response()
}

async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match state.engine.status(&id).await {
        Some(result) => Json(result).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("unknown workflow '{id}'")),
    }
}

#[derive(Serialize)]
struct CancelResponse {
    cancelled: bool,
}

async fn cancel_workflow(State(state): State<AppState>, Path(id): Path<String>) -> Json<CancelResponse> {
    let cancelled = state.engine.cancel(&id).await;
    Json(CancelResponse { cancelled })
}

async fn get_template(Path(name): Path<String>) -> axum::response::Response {
    match weave_builtins::templates::get(&name) {
        Some(request) => Json(request).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("unknown template '{name}'")),
    }
}
